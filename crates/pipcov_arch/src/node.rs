//! Resource names and their derived attributes.
//!
//! A routing resource is named `TILE/PORT`. Everything the router and the
//! allocator need to know about a resource (which tile type it lives in,
//! whether it is a LUT pin or an FF pin, which clock group it belongs to) is
//! decided here, once, from the string form. The result is a closed
//! [`Role`] enum so downstream code matches exhaustively instead of
//! re-inspecting names.

use pipcov_common::Coord;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tile name used for virtual helper nodes.
pub const VIRTUAL_TILE: &str = "VIRTUAL";
/// Port of the global virtual source.
pub const SOURCE_PORT: &str = "SOURCE";
/// Port of the global virtual sink.
pub const SINK_PORT: &str = "SINK";

const LOGIC_PORT_PREFIX_L: &str = "CLE_CLE_L_SITE_0_";
const LOGIC_PORT_PREFIX_M: &str = "CLE_CLE_M_SITE_0_";

/// Number of LUT/FF labels (A..H) per logic tile.
pub const LABEL_COUNT: u8 = 8;

/// Error returned for a resource name that is not `TILE/PORT`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed node name {0:?}: expected TILE/PORT")]
pub struct NodeParseError(pub String);

/// Coarse class of a tile, decided by its name prefix.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum TileKind {
    /// Interconnect tile (`INT`), home of the PIPs under test.
    Int,
    /// Logic tile west of the interconnect tile (`CLEL_L`, `CLEM`).
    LogicWest,
    /// Logic tile east of the interconnect tile (`CLEL_R`, `CLEM_R`).
    LogicEast,
    /// The `VIRTUAL` pseudo-tile.
    Virtual,
    /// Anything else.
    Other,
}

impl TileKind {
    /// Classifies a tile by its prefix (the name without `_X..Y..`).
    pub fn of_prefix(prefix: &str) -> Self {
        match prefix {
            "INT" => TileKind::Int,
            "CLEL_L" | "CLEM" => TileKind::LogicWest,
            "CLEL_R" | "CLEM_R" => TileKind::LogicEast,
            VIRTUAL_TILE => TileKind::Virtual,
            _ => TileKind::Other,
        }
    }

    /// Returns the side of the interconnect tile a logic tile sits on.
    pub fn side(self) -> Option<Side> {
        match self {
            TileKind::LogicWest => Some(Side::West),
            TileKind::LogicEast => Some(Side::East),
            _ => None,
        }
    }

    /// Returns `true` for CLB tiles.
    pub fn is_logic(self) -> bool {
        self.side().is_some()
    }
}

/// Which side of its interconnect tile a logic tile occupies.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum Side {
    /// West (`CLEM`, `CLEL_L`).
    West,
    /// East (`CLEL_R`, `CLEM_R`).
    East,
}

impl Side {
    /// The other side.
    pub fn opposite(self) -> Self {
        match self {
            Side::West => Side::East,
            Side::East => Side::West,
        }
    }

    /// Single-letter suffix used in interconnect port names.
    pub fn letter(self) -> char {
        match self {
            Side::West => 'W',
            Side::East => 'E',
        }
    }
}

/// Which half of a logic tile a label belongs to.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum Half {
    /// Labels A..D.
    Bottom,
    /// Labels E..H.
    Top,
}

/// A LUT/FF position letter inside a logic tile, `A` (0) to `H` (7).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct Label(u8);

impl Label {
    /// Creates a label from its index; `None` past `H`.
    pub fn new(index: u8) -> Option<Self> {
        (index < LABEL_COUNT).then_some(Self(index))
    }

    /// Parses `'A'..='H'`.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'A'..='H' => Some(Self(c as u8 - b'A')),
            _ => None,
        }
    }

    /// All eight labels in order.
    pub fn all() -> impl Iterator<Item = Label> {
        (0..LABEL_COUNT).map(Label)
    }

    /// Index `0..8`.
    pub fn index(self) -> u8 {
        self.0
    }

    /// The letter.
    pub fn as_char(self) -> char {
        (b'A' + self.0) as char
    }

    /// Clock-half of this label.
    pub fn half(self) -> Half {
        if self.0 < LABEL_COUNT / 2 {
            Half::Bottom
        } else {
            Half::Top
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Primary or secondary flip-flop of a label.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum FfIndex {
    /// `<L>FF`: input `<L>X`, output `<L>Q`.
    Primary,
    /// `<L>FF2`: input `<L>_I`, output `<L>Q2`.
    Secondary,
}

impl FfIndex {
    /// The other flip-flop of the same label.
    pub fn other(self) -> Self {
        match self {
            FfIndex::Primary => FfIndex::Secondary,
            FfIndex::Secondary => FfIndex::Primary,
        }
    }
}

/// A physical clock group: four per coordinate.
///
/// All FFs of one half of one logic tile share a clock net, so they must all
/// launch or all sample within one configuration.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct ClockGroup {
    /// Side of the logic tile.
    pub side: Side,
    /// Half of the logic tile.
    pub half: Half,
}

impl ClockGroup {
    /// The conflicting group: same half, opposite side.
    pub fn sibling(self) -> Self {
        Self {
            side: self.side.opposite(),
            half: self.half,
        }
    }
}

impl fmt::Display for ClockGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let half = match self.half {
            Half::Bottom => "bottom",
            Half::Top => "top",
        };
        write!(f, "{}-{half}", self.side.letter())
    }
}

/// What a port is, as far as routing and allocation are concerned.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Role {
    /// LUT input pin `k` in `1..=6`.
    LutInput {
        /// LUT position.
        label: Label,
        /// Pin number.
        pin: u8,
    },
    /// FF data input (`<L>X` / `<L>_I`).
    FfInput {
        /// FF position.
        label: Label,
        /// Which of the two FFs.
        index: FfIndex,
    },
    /// FF output (`<L>Q` / `<L>Q2`).
    FfOutput {
        /// FF position.
        label: Label,
        /// Which of the two FFs.
        index: FfIndex,
    },
    /// Unmuxed LUT output (`<L>_O`, the O6 output).
    LutOutput {
        /// LUT position.
        label: Label,
    },
    /// Muxed CLB output (`<L>MUX`).
    MuxOutput {
        /// LUT position.
        label: Label,
    },
    /// Interconnect-tile wire.
    Wire,
    /// Virtual source, sink or search helper.
    Virtual,
    /// Unclassified port.
    Other,
}

impl Role {
    /// The label of a logic-tile pin.
    pub fn label(self) -> Option<Label> {
        match self {
            Role::LutInput { label, .. }
            | Role::FfInput { label, .. }
            | Role::FfOutput { label, .. }
            | Role::LutOutput { label }
            | Role::MuxOutput { label } => Some(label),
            Role::Wire | Role::Virtual | Role::Other => None,
        }
    }

    /// Returns `true` for FF inputs and outputs.
    pub fn is_ff_pin(self) -> bool {
        matches!(self, Role::FfInput { .. } | Role::FfOutput { .. })
    }

    /// Returns `true` for the two CLB outputs a LUT can drive.
    pub fn is_clb_output(self) -> bool {
        matches!(self, Role::LutOutput { .. } | Role::MuxOutput { .. })
    }

    /// The port suffix after `CLE_CLE_<L|M>_SITE_0_`.
    pub fn logic_suffix(self) -> Option<String> {
        let s = match self {
            Role::LutInput { label, pin } => format!("{label}{pin}"),
            Role::FfInput {
                label,
                index: FfIndex::Primary,
            } => format!("{label}X"),
            Role::FfInput {
                label,
                index: FfIndex::Secondary,
            } => format!("{label}_I"),
            Role::FfOutput {
                label,
                index: FfIndex::Primary,
            } => format!("{label}Q"),
            Role::FfOutput {
                label,
                index: FfIndex::Secondary,
            } => format!("{label}Q2"),
            Role::LutOutput { label } => format!("{label}_O"),
            Role::MuxOutput { label } => format!("{label}MUX"),
            Role::Wire | Role::Virtual | Role::Other => return None,
        };
        Some(s)
    }
}

/// Site flavor of a logic tile, visible in its port prefix.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum SiteFlavor {
    /// SLICEL (`CLEL_*`).
    L,
    /// SLICEM (`CLEM*`).
    M,
}

impl SiteFlavor {
    /// Site flavor of a logic tile prefix.
    pub fn of_prefix(prefix: &str) -> Option<Self> {
        if prefix.starts_with("CLEL") {
            Some(SiteFlavor::L)
        } else if prefix.starts_with("CLEM") {
            Some(SiteFlavor::M)
        } else {
            None
        }
    }

    fn port_prefix(self) -> &'static str {
        match self {
            SiteFlavor::L => LOGIC_PORT_PREFIX_L,
            SiteFlavor::M => LOGIC_PORT_PREFIX_M,
        }
    }

    /// Full port name of a logic-tile role.
    pub fn port(self, role: Role) -> Option<String> {
        role.logic_suffix()
            .map(|suffix| format!("{}{suffix}", self.port_prefix()))
    }
}

/// Classifies a port of a tile of kind `kind`.
pub fn classify_port(kind: TileKind, port: &str) -> Role {
    match kind {
        TileKind::Int => Role::Wire,
        TileKind::Virtual => Role::Virtual,
        TileKind::Other => Role::Other,
        TileKind::LogicWest | TileKind::LogicEast => {
            let suffix = port
                .strip_prefix(LOGIC_PORT_PREFIX_L)
                .or_else(|| port.strip_prefix(LOGIC_PORT_PREFIX_M));
            suffix.map_or(Role::Other, classify_logic_suffix)
        }
    }
}

fn classify_logic_suffix(suffix: &str) -> Role {
    let mut chars = suffix.chars();
    let Some(label) = chars.next().and_then(Label::from_char) else {
        return Role::Other;
    };
    match chars.as_str() {
        "X" => Role::FfInput {
            label,
            index: FfIndex::Primary,
        },
        "_I" => Role::FfInput {
            label,
            index: FfIndex::Secondary,
        },
        "Q" => Role::FfOutput {
            label,
            index: FfIndex::Primary,
        },
        "Q2" => Role::FfOutput {
            label,
            index: FfIndex::Secondary,
        },
        "_O" => Role::LutOutput { label },
        "MUX" => Role::MuxOutput { label },
        pin @ ("1" | "2" | "3" | "4" | "5" | "6") => Role::LutInput {
            label,
            pin: pin.as_bytes()[0] - b'0',
        },
        _ => Role::Other,
    }
}

/// Parsed form of a `TILE/PORT` resource name.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct NodeInfo {
    /// Full tile name.
    pub tile: String,
    /// Tile name without coordinate suffix.
    pub prefix: String,
    /// Port within the tile.
    pub port: String,
    /// Coordinate of the tile, absent for virtual and unplaced tiles.
    pub coord: Option<Coord>,
    /// Tile class.
    pub tile_kind: TileKind,
    /// Port role.
    pub role: Role,
}

impl NodeInfo {
    /// Parses and classifies a resource name.
    pub fn parse(name: &str) -> Result<Self, NodeParseError> {
        let (tile, port) = name
            .split_once('/')
            .filter(|(t, p)| !t.is_empty() && !p.is_empty())
            .ok_or_else(|| NodeParseError(name.to_string()))?;
        Ok(Self::from_parts(tile, port))
    }

    /// Classifies an already split tile and port.
    pub fn from_parts(tile: &str, port: &str) -> Self {
        let (prefix, coord) = match Coord::split_tile_name(tile) {
            Some((prefix, coord)) => (prefix, Some(coord)),
            None => (tile, None),
        };
        let tile_kind = TileKind::of_prefix(prefix);
        Self {
            tile: tile.to_string(),
            prefix: prefix.to_string(),
            port: port.to_string(),
            coord,
            tile_kind,
            role: classify_port(tile_kind, port),
        }
    }

    /// `TILE/PORT`.
    pub fn name(&self) -> String {
        node_name(&self.tile, &self.port)
    }

    /// Clock group of an FF pin.
    pub fn clock_group(&self) -> Option<ClockGroup> {
        if !self.role.is_ff_pin() {
            return None;
        }
        Some(ClockGroup {
            side: self.tile_kind.side()?,
            half: self.role.label()?.half(),
        })
    }

    /// BEL this pin belongs to: `<L>LUT`, `<L>FF` or `<L>FF2`.
    pub fn bel(&self) -> Option<String> {
        match self.role {
            Role::LutInput { label, .. } | Role::LutOutput { label } | Role::MuxOutput { label } => {
                Some(format!("{label}LUT"))
            }
            Role::FfInput { label, index } | Role::FfOutput { label, index } => Some(match index {
                FfIndex::Primary => format!("{label}FF"),
                FfIndex::Secondary => format!("{label}FF2"),
            }),
            Role::Wire | Role::Virtual | Role::Other => None,
        }
    }
}

/// Joins a tile and a port into a resource name.
pub fn node_name(tile: &str, port: &str) -> String {
    format!("{tile}/{port}")
}

/// Name of a virtual node.
pub fn virtual_node(port: &str) -> String {
    node_name(VIRTUAL_TILE, port)
}

/// Moves a tile name by `(dx, dy)`. Tiles without a coordinate stay put.
pub fn relocate_tile(tile: &str, dx: i32, dy: i32) -> String {
    match Coord::split_tile_name(tile) {
        Some((prefix, coord)) => coord.offset(dx, dy).tile_name(prefix),
        None => tile.to_string(),
    }
}

/// Moves a resource name by `(dx, dy)`, rewriting only the tile coordinate.
pub fn relocate_node(name: &str, dx: i32, dy: i32) -> Result<String, NodeParseError> {
    let (tile, port) = name
        .split_once('/')
        .ok_or_else(|| NodeParseError(name.to_string()))?;
    Ok(node_name(&relocate_tile(tile, dx, dy), port))
}
