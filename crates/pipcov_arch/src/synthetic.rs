//! A small deterministic UltraScale+-style fabric.
//!
//! Every coordinate has an `INT` tile and an east `CLEL_R` tile; a west
//! `CLEM` tile exists except in every third column (`x % 3 == 2`), so
//! relocation sees columns of two different shapes. The interconnect tile
//! has eight unit-length direction wires (`NN1`, `EE1`, `SS1`, `WW1`, two of
//! each), 64 input muxes and 32 logic outputs per side:
//!
//! - `IMUX_<s><n>` with `n = label * 8 + slot` drives LUT pins 1..6
//!   (slots 0..5), the primary FF input (slot 6) and the secondary FF input
//!   (slot 7) of the logic tile on side `s`;
//! - `LOGIC_OUTS_<s><n>` with `n = label * 4 + slot` is driven by `_O`,
//!   `MUX`, `Q` and `Q2` (slots 0..3).
//!
//! Each `END` wire reaches every `BEG` wire; each logic output reaches two
//! `BEG` wires and each input mux is reachable from two `END` wires. West
//! side connections are rotated by one wire.

use std::collections::BTreeMap;

use pipcov_common::Coord;

use crate::device::{Device, DeviceData, Tile, TileType, WireConn};
use crate::node::{node_name, FfIndex, Label, Role, Side, SiteFlavor, TileKind};

/// Device-name prefix selecting the synthetic fabric.
pub const SYNTHETIC_PREFIX: &str = "synthetic-";

/// Number of `BEG`/`END` wire pairs per interconnect tile.
pub const DIRECTION_WIRES: usize = 8;

const DIRECTIONS: [(&str, i32, i32); 4] = [("NN", 0, 1), ("EE", 1, 0), ("SS", 0, -1), ("WW", -1, 0)];
const CLOCK_REGION_SIZE: i32 = 4;
const IMUX_SLOTS: u8 = 8;
const OUT_SLOTS: u8 = 4;

/// Name of direction wire `i` (`0..8`), `BEG` or `END` end.
pub fn direction_wire(i: usize, beg: bool) -> String {
    let (dir, _, _) = DIRECTIONS[i / 2];
    let end = if beg { "BEG" } else { "END" };
    format!("{dir}1{end}{}", i % 2)
}

/// Interconnect port of input mux `n` on side `side`.
pub fn imux_port(side: Side, n: u8) -> String {
    format!("IMUX_{}{n}", side.letter())
}

/// Interconnect port of logic output `n` on side `side`.
pub fn logic_out_port(side: Side, n: u8) -> String {
    format!("LOGIC_OUTS_{}{n}", side.letter())
}

fn imux_role(label: Label, slot: u8) -> Role {
    match slot {
        0..=5 => Role::LutInput { label, pin: slot + 1 },
        6 => Role::FfInput {
            label,
            index: FfIndex::Primary,
        },
        _ => Role::FfInput {
            label,
            index: FfIndex::Secondary,
        },
    }
}

fn out_role(label: Label, slot: u8) -> Role {
    match slot {
        0 => Role::LutOutput { label },
        1 => Role::MuxOutput { label },
        2 => Role::FfOutput {
            label,
            index: FfIndex::Primary,
        },
        _ => Role::FfOutput {
            label,
            index: FfIndex::Secondary,
        },
    }
}

fn rotation(side: Side) -> usize {
    match side {
        Side::East => 0,
        Side::West => 1,
    }
}

/// Parses `<W>x<H>` with both dimensions at least one.
pub fn parse_dims(dims: &str) -> Option<(i32, i32)> {
    let (w, h) = dims.split_once('x')?;
    let w: i32 = w.parse().ok()?;
    let h: i32 = h.parse().ok()?;
    (w > 0 && h > 0).then_some((w, h))
}

fn int_tile_type() -> TileType {
    let mut pairs = Vec::new();
    for i in 0..DIRECTION_WIRES {
        for j in 0..DIRECTION_WIRES {
            pairs.push((direction_wire(i, false), direction_wire(j, true)));
        }
    }
    for side in [Side::East, Side::West] {
        let r = rotation(side);
        for n in 0..Label::all().count() as u8 * OUT_SLOTS {
            let src = logic_out_port(side, n);
            for k in [0, 3] {
                let beg = (n as usize + k + r) % DIRECTION_WIRES;
                pairs.push((src.clone(), direction_wire(beg, true)));
            }
        }
        for n in 0..Label::all().count() as u8 * IMUX_SLOTS {
            let dst = imux_port(side, n);
            for k in [0, 5] {
                let end = (n as usize + k + r) % DIRECTION_WIRES;
                pairs.push((direction_wire(end, false), dst.clone()));
            }
        }
    }
    TileType::from_pairs(pairs)
}

fn clock_region(coord: Coord) -> String {
    Coord::new(coord.x / CLOCK_REGION_SIZE, coord.y / CLOCK_REGION_SIZE).to_string()
}

/// Builds the synthetic fabric of `width` x `height` coordinates.
pub fn build(width: i32, height: i32) -> Device {
    let mut tiles = Vec::new();
    let mut wires = Vec::new();
    let mut sites = BTreeMap::new();

    for y in 0..height {
        for x in 0..width {
            let coord = Coord::new(x, y);
            let region = clock_region(coord);
            let int = coord.tile_name("INT");
            tiles.push(Tile {
                name: int.clone(),
                tile_type: "INT".into(),
                kind: TileKind::Int,
                coord,
                clock_region: region.clone(),
            });

            for i in 0..DIRECTION_WIRES {
                let (_, dx, dy) = DIRECTIONS[i / 2];
                let dest = coord.offset(dx, dy);
                if (0..width).contains(&dest.x) && (0..height).contains(&dest.y) {
                    wires.push(WireConn {
                        from: node_name(&int, &direction_wire(i, true)),
                        to: node_name(&dest.tile_name("INT"), &direction_wire(i, false)),
                    });
                }
            }

            let mut logic = vec![("CLEL_R", Side::East, 2 * x + 1)];
            if x % 3 != 2 {
                logic.push(("CLEM", Side::West, 2 * x));
            }
            for (prefix, side, site_x) in logic {
                let name = coord.tile_name(prefix);
                let kind = TileKind::of_prefix(prefix);
                let Some(flavor) = SiteFlavor::of_prefix(prefix) else {
                    continue;
                };
                tiles.push(Tile {
                    name: name.clone(),
                    tile_type: prefix.into(),
                    kind,
                    coord,
                    clock_region: region.clone(),
                });
                sites.insert(name.clone(), format!("SLICE_X{site_x}Y{y}"));

                for label in Label::all() {
                    for slot in 0..IMUX_SLOTS {
                        let n = label.index() * IMUX_SLOTS + slot;
                        if let Some(port) = flavor.port(imux_role(label, slot)) {
                            wires.push(WireConn {
                                from: node_name(&int, &imux_port(side, n)),
                                to: node_name(&name, &port),
                            });
                        }
                    }
                    for slot in 0..OUT_SLOTS {
                        let n = label.index() * OUT_SLOTS + slot;
                        if let Some(port) = flavor.port(out_role(label, slot)) {
                            wires.push(WireConn {
                                from: node_name(&name, &port),
                                to: node_name(&int, &logic_out_port(side, n)),
                            });
                        }
                    }
                }
            }
        }
    }

    let mut tile_types = BTreeMap::new();
    tile_types.insert("INT".to_string(), int_tile_type());
    tile_types.insert("CLEL_R".to_string(), TileType::default());
    tile_types.insert("CLEM".to_string(), TileType::default());

    Device::new(DeviceData {
        name: format!("{SYNTHETIC_PREFIX}{width}x{height}"),
        tiles,
        tile_types,
        wires,
        sites,
    })
}
