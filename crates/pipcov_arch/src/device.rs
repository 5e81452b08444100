//! The read-only Device Model.
//!
//! A [`Device`] is a [`DeviceData`] (the persisted part: tiles, tile-type PIP
//! templates, inter-tile wires and the CLB-to-site map) plus lookup indexes
//! rebuilt whenever the data is loaded.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};

use pipcov_common::Coord;
use pipcov_store::{read_artifact, write_artifact, ArtifactKind};
use serde::{Deserialize, Serialize};

use crate::error::ArchError;
use crate::node::{TileKind, VIRTUAL_TILE};
use crate::synthetic;

/// File extension of device blobs.
pub const DEVICE_EXT: &str = "pcdev";

/// One placed tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    /// Full name, e.g. `CLEL_R_X3Y4`.
    pub name: String,
    /// Tile type, the name without coordinate, e.g. `CLEL_R`.
    pub tile_type: String,
    /// Coarse class.
    pub kind: TileKind,
    /// Grid position.
    pub coord: Coord,
    /// Clock region, e.g. `X0Y1`.
    pub clock_region: String,
}

/// A PIP of a tile type, between two ports of the same tile.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PipTemplate {
    /// Driving port.
    pub src: String,
    /// Driven port.
    pub dst: String,
    /// Whether the reverse PIP `dst -> src` also exists.
    pub bidirectional: bool,
}

/// PIP templates shared by all tiles of one type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileType {
    /// All PIPs of the type.
    pub pips: Vec<PipTemplate>,
}

impl TileType {
    /// Builds a tile type from `(src, dst)` pairs, deriving the bidirectional
    /// flag from the presence of the reverse pair.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let pairs: Vec<(String, String)> = pairs.into_iter().collect();
        let set: HashSet<(&str, &str)> = pairs.iter().map(|(s, d)| (s.as_str(), d.as_str())).collect();
        let pips = pairs
            .iter()
            .map(|(src, dst)| PipTemplate {
                src: src.clone(),
                dst: dst.clone(),
                bidirectional: set.contains(&(dst.as_str(), src.as_str())),
            })
            .collect();
        Self { pips }
    }
}

/// A fixed directed connection between ports of two different tiles.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WireConn {
    /// Driving node, `TILE/PORT`.
    pub from: String,
    /// Driven node, `TILE/PORT`.
    pub to: String,
}

/// The persisted part of a device description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceData {
    /// Device name the blob is keyed by.
    pub name: String,
    /// All tiles.
    pub tiles: Vec<Tile>,
    /// Tile types by name.
    pub tile_types: BTreeMap<String, TileType>,
    /// Inter-tile wires.
    pub wires: Vec<WireConn>,
    /// CLB tile name to site name.
    pub sites: BTreeMap<String, String>,
}

#[derive(Debug, Default)]
struct DeviceIndex {
    tile_by_name: HashMap<String, usize>,
    tiles_at: HashMap<Coord, Vec<usize>>,
    pips: HashMap<String, HashSet<(String, String)>>,
    wires_out: HashMap<String, Vec<String>>,
    wires_in: HashMap<String, Vec<String>>,
    int_coords: Vec<Coord>,
}

/// A loaded device.
#[derive(Debug)]
pub struct Device {
    data: DeviceData,
    index: DeviceIndex,
}

impl Device {
    /// Indexes device data.
    pub fn new(data: DeviceData) -> Self {
        let mut index = DeviceIndex::default();
        for (i, tile) in data.tiles.iter().enumerate() {
            index.tile_by_name.insert(tile.name.clone(), i);
            index.tiles_at.entry(tile.coord).or_default().push(i);
            if tile.kind == TileKind::Int {
                index.int_coords.push(tile.coord);
            }
        }
        index.int_coords.sort();
        index.int_coords.dedup();
        for (name, tt) in &data.tile_types {
            let set = tt
                .pips
                .iter()
                .map(|p| (p.src.clone(), p.dst.clone()))
                .collect();
            index.pips.insert(name.clone(), set);
        }
        for w in &data.wires {
            index
                .wires_out
                .entry(w.from.clone())
                .or_default()
                .push(w.to.clone());
            index
                .wires_in
                .entry(w.to.clone())
                .or_default()
                .push(w.from.clone());
        }
        Self { data, index }
    }

    /// Loads a device by name.
    ///
    /// `synthetic-<W>x<H>` builds the built-in fabric; any other name is read
    /// from `<data_dir>/<name>.pcdev`.
    pub fn load(data_dir: &Path, name: &str) -> Result<Self, ArchError> {
        if let Some(dims) = name.strip_prefix(synthetic::SYNTHETIC_PREFIX) {
            let (w, h) = synthetic::parse_dims(dims)
                .ok_or_else(|| ArchError::BadSyntheticName(name.to_string()))?;
            return Ok(synthetic::build(w, h));
        }
        let path = Self::blob_path(data_dir, name);
        if !path.is_file() {
            return Err(ArchError::UnknownDevice {
                name: name.to_string(),
                path,
            });
        }
        let data: DeviceData = read_artifact(&path, ArtifactKind::Device)?;
        if data.name != name {
            return Err(ArchError::NameMismatch {
                expected: name.to_string(),
                found: data.name,
            });
        }
        Ok(Self::new(data))
    }

    /// Path of the blob for `name` under `data_dir`.
    pub fn blob_path(data_dir: &Path, name: &str) -> PathBuf {
        data_dir.join(format!("{name}.{DEVICE_EXT}"))
    }

    /// Writes this device as a blob.
    pub fn save(&self, path: &Path) -> Result<(), ArchError> {
        write_artifact(path, ArtifactKind::Device, &self.data)?;
        Ok(())
    }

    /// The persisted data.
    pub fn data(&self) -> &DeviceData {
        &self.data
    }

    /// Device name.
    pub fn name(&self) -> &str {
        &self.data.name
    }

    /// Looks up a tile by name.
    pub fn tile(&self, name: &str) -> Option<&Tile> {
        self.index
            .tile_by_name
            .get(name)
            .map(|&i| &self.data.tiles[i])
    }

    /// Returns `true` if the tile exists. The virtual tile always exists.
    pub fn has_tile(&self, name: &str) -> bool {
        name == VIRTUAL_TILE || self.index.tile_by_name.contains_key(name)
    }

    /// All tiles at a coordinate.
    pub fn tiles_at(&self, coord: Coord) -> impl Iterator<Item = &Tile> {
        self.index
            .tiles_at
            .get(&coord)
            .into_iter()
            .flatten()
            .map(|&i| &self.data.tiles[i])
    }

    fn tile_at(&self, coord: Coord, kind: TileKind) -> Option<&Tile> {
        self.tiles_at(coord).find(|t| t.kind == kind)
    }

    /// The interconnect tile at a coordinate.
    pub fn int_tile(&self, coord: Coord) -> Option<&Tile> {
        self.tile_at(coord, TileKind::Int)
    }

    /// The logic tile west of the interconnect tile at a coordinate.
    pub fn west_tile(&self, coord: Coord) -> Option<&Tile> {
        self.tile_at(coord, TileKind::LogicWest)
    }

    /// The logic tile east of the interconnect tile at a coordinate.
    pub fn east_tile(&self, coord: Coord) -> Option<&Tile> {
        self.tile_at(coord, TileKind::LogicEast)
    }

    /// The set of tile types present at a coordinate.
    pub fn tile_types_at(&self, coord: Coord) -> BTreeSet<&str> {
        self.tiles_at(coord).map(|t| t.tile_type.as_str()).collect()
    }

    /// Every coordinate holding an interconnect tile, sorted by (x, y).
    pub fn int_coords(&self) -> &[Coord] {
        &self.index.int_coords
    }

    /// Clock region of a coordinate.
    pub fn clock_region(&self, coord: Coord) -> Option<&str> {
        self.tiles_at(coord).next().map(|t| t.clock_region.as_str())
    }

    /// PIP templates of a tile type.
    pub fn tile_type(&self, tile_type: &str) -> Option<&TileType> {
        self.data.tile_types.get(tile_type)
    }

    /// PIP templates of the type of tile `tile`.
    pub fn pips_of_tile(&self, tile: &str) -> &[PipTemplate] {
        self.tile(tile)
            .and_then(|t| self.tile_type(&t.tile_type))
            .map(|tt| tt.pips.as_slice())
            .unwrap_or(&[])
    }

    /// Returns `true` if tile type `tile_type` has PIP `src -> dst`.
    pub fn has_pip(&self, tile_type: &str, src: &str, dst: &str) -> bool {
        self.index
            .pips
            .get(tile_type)
            .is_some_and(|set| set.contains(&(src.to_string(), dst.to_string())))
    }

    /// Returns `true` if the reverse PIP `dst -> src` exists.
    pub fn has_reverse_pip(&self, tile_type: &str, src: &str, dst: &str) -> bool {
        self.has_pip(tile_type, dst, src)
    }

    /// Returns `true` if the directed wire `from -> to` exists.
    pub fn has_wire(&self, from: &str, to: &str) -> bool {
        self.index
            .wires_out
            .get(from)
            .is_some_and(|targets| targets.iter().any(|t| t == to))
    }

    /// Nodes driven by `node` through wires.
    pub fn wires_from(&self, node: &str) -> &[String] {
        self.index
            .wires_out
            .get(node)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Nodes driving `node` through wires.
    pub fn wires_into(&self, node: &str) -> &[String] {
        self.index
            .wires_in
            .get(node)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Site name of a CLB tile.
    pub fn site_of(&self, tile: &str) -> Option<&str> {
        self.data.sites.get(tile).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny() -> DeviceData {
        let tile = |name: &str, tt: &str, kind, x, y| Tile {
            name: name.into(),
            tile_type: tt.into(),
            kind,
            coord: Coord::new(x, y),
            clock_region: "X0Y0".into(),
        };
        let mut tile_types = BTreeMap::new();
        tile_types.insert(
            "INT".to_string(),
            TileType::from_pairs([
                ("A".to_string(), "B".to_string()),
                ("B".to_string(), "A".to_string()),
                ("A".to_string(), "C".to_string()),
            ]),
        );
        DeviceData {
            name: "tiny".into(),
            tiles: vec![
                tile("INT_X0Y0", "INT", TileKind::Int, 0, 0),
                tile("CLEL_R_X0Y0", "CLEL_R", TileKind::LogicEast, 0, 0),
                tile("INT_X1Y0", "INT", TileKind::Int, 1, 0),
            ],
            tile_types,
            wires: vec![WireConn {
                from: "INT_X0Y0/C".into(),
                to: "INT_X1Y0/A".into(),
            }],
            sites: BTreeMap::from([("CLEL_R_X0Y0".to_string(), "SLICE_X1Y0".to_string())]),
        }
    }

    #[test]
    fn bidirectional_flag_from_reverse_pip() {
        let dev = Device::new(tiny());
        let pips = dev.pips_of_tile("INT_X0Y0");
        assert_eq!(pips.len(), 3);
        assert!(pips.iter().find(|p| p.src == "A" && p.dst == "B").unwrap().bidirectional);
        assert!(!pips.iter().find(|p| p.src == "A" && p.dst == "C").unwrap().bidirectional);
        assert!(dev.has_reverse_pip("INT", "A", "B"));
        assert!(!dev.has_reverse_pip("INT", "A", "C"));
    }

    #[test]
    fn coordinate_queries() {
        let dev = Device::new(tiny());
        let c = Coord::new(0, 0);
        assert_eq!(dev.int_tile(c).unwrap().name, "INT_X0Y0");
        assert_eq!(dev.east_tile(c).unwrap().name, "CLEL_R_X0Y0");
        assert!(dev.west_tile(c).is_none());
        assert_eq!(dev.int_coords(), &[Coord::new(0, 0), Coord::new(1, 0)]);
        assert_eq!(dev.tile_types_at(c).into_iter().collect::<Vec<_>>(), vec!["CLEL_R", "INT"]);
        assert_eq!(dev.clock_region(c), Some("X0Y0"));
        assert_eq!(dev.site_of("CLEL_R_X0Y0"), Some("SLICE_X1Y0"));
    }

    #[test]
    fn wire_queries() {
        let dev = Device::new(tiny());
        assert!(dev.has_wire("INT_X0Y0/C", "INT_X1Y0/A"));
        assert!(!dev.has_wire("INT_X1Y0/A", "INT_X0Y0/C"));
        assert_eq!(dev.wires_from("INT_X0Y0/C"), &["INT_X1Y0/A".to_string()]);
        assert_eq!(dev.wires_into("INT_X1Y0/A"), &["INT_X0Y0/C".to_string()]);
        assert!(dev.wires_from("nowhere").is_empty());
    }

    #[test]
    fn save_and_load_blob() {
        let dir = tempfile::tempdir().unwrap();
        let dev = Device::new(tiny());
        dev.save(&Device::blob_path(dir.path(), "tiny")).unwrap();
        let back = Device::load(dir.path(), "tiny").unwrap();
        assert_eq!(back.data(), dev.data());
        assert!(back.has_pip("INT", "A", "C"));
    }

    #[test]
    fn blob_name_mismatch_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let dev = Device::new(tiny());
        dev.save(&Device::blob_path(dir.path(), "other")).unwrap();
        let err = Device::load(dir.path(), "other").unwrap_err();
        assert!(matches!(err, ArchError::NameMismatch { .. }));
    }

    #[test]
    fn unknown_device_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = Device::load(dir.path(), "xcvu9p").unwrap_err();
        assert!(matches!(err, ArchError::UnknownDevice { .. }));
    }

    #[test]
    fn synthetic_name_dispatch() {
        let dir = tempfile::tempdir().unwrap();
        let dev = Device::load(dir.path(), "synthetic-3x2").unwrap();
        assert_eq!(dev.name(), "synthetic-3x2");
        assert_eq!(dev.int_coords().len(), 6);
        assert!(matches!(
            Device::load(dir.path(), "synthetic-3"),
            Err(ArchError::BadSyntheticName(_))
        ));
    }
}
