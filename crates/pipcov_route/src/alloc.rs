//! LUT, SubLUT and FF allocation tables of one configuration.
//!
//! LUTs and FFs are created lazily the first time a Cut touches them and
//! are keyed by tile and label; SubLUTs live in an append-only arena. Every
//! mutation is journaled as an [`AllocChange`] so a failed Cut is undone
//! exactly, and [`Allocation::capacity_conserved`] holds after any sequence
//! of allocations and rollbacks.

use std::collections::BTreeMap;
use std::fmt;

use pipcov_arch::{FfIndex, Label};
use pipcov_common::{InternalError, PipcovResult};
use serde::{Deserialize, Serialize};

use crate::ids::{CutId, SubLutId};
use crate::ledger::{Change, Journal};

/// Capacity of an unused LUT: one 6-input or two 5-input functions.
pub const LUT_CAPACITY: u8 = 2;

/// A LUT position: logic tile and label.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct LutId {
    /// Logic tile name.
    pub tile: String,
    /// LUT label.
    pub label: Label,
}

impl fmt::Display for LutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}LUT", self.tile, self.label)
    }
}

/// An FF position: logic tile, label and index.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct FfId {
    /// Logic tile name.
    pub tile: String,
    /// FF label.
    pub label: Label,
    /// Primary or secondary.
    pub index: FfIndex,
}

impl fmt::Display for FfId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suffix = match self.index {
            FfIndex::Primary => "",
            FfIndex::Secondary => "2",
        };
        write!(f, "{}/{}FF{suffix}", self.tile, self.label)
    }
}

/// Boolean function of a SubLUT.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum LutFunction {
    /// Inverts its single input.
    Not,
    /// Passes its single input through.
    Buffer,
    /// Parity of all inputs.
    Xor,
}

impl LutFunction {
    fn eval(self, inputs: impl Iterator<Item = bool>) -> bool {
        let mut inputs = inputs;
        match self {
            LutFunction::Not => !inputs.next().unwrap_or(false),
            LutFunction::Buffer => inputs.next().unwrap_or(false),
            LutFunction::Xor => inputs.fold(false, |acc, b| acc ^ b),
        }
    }
}

/// Which part of a LUT a SubLUT occupies.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum LutHalf {
    /// Upper 32 bits, output `_O`.
    O6,
    /// Lower 32 bits, feeding the FF internally.
    O5,
    /// All 64 bits.
    Full,
}

/// Usage tag of an allocation unit.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub enum Usage {
    /// Unused.
    #[default]
    Free,
    /// Used by a Cut of the in-flight configuration.
    Used,
    /// Finalized; never reused in this configuration.
    Blocked,
}

/// One boolean-function use of a LUT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubLut {
    /// Owning LUT.
    pub lut: LutId,
    /// Function.
    pub function: LutFunction,
    /// `(pin, node name)` of every input, pins in `1..=6`.
    pub inputs: Vec<(u8, String)>,
    /// Driven CLB output node, if any.
    pub output: Option<String>,
    /// Whether the output is the muxed one.
    pub muxed: bool,
    /// Occupied half.
    pub half: LutHalf,
    /// Owning Cut.
    pub cut: CutId,
    /// Usage tag.
    pub usage: Usage,
}

impl SubLut {
    /// 2 if the 6th input or the muxed output is used, otherwise 1.
    pub fn occupancy(&self) -> u8 {
        occupancy(&self.inputs, self.muxed)
    }
}

fn occupancy(inputs: &[(u8, String)], muxed: bool) -> u8 {
    if muxed || inputs.iter().any(|(pin, _)| *pin == 6) {
        2
    } else {
        1
    }
}

/// A LUT and the SubLUTs it holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lut {
    /// Remaining capacity.
    pub capacity: u8,
    /// SubLUT in the upper half.
    pub o6: Option<SubLutId>,
    /// SubLUT in the lower half.
    pub o5: Option<SubLutId>,
    /// SubLUT using the whole LUT.
    pub full: Option<SubLutId>,
    /// Usage tag.
    pub usage: Usage,
    /// SubLUTs in allocation order.
    pub subluts: Vec<SubLutId>,
}

impl Default for Lut {
    fn default() -> Self {
        Self {
            capacity: LUT_CAPACITY,
            o6: None,
            o5: None,
            full: None,
            usage: Usage::Free,
            subluts: Vec::new(),
        }
    }
}

impl Lut {
    fn half_free(&self, half: LutHalf) -> bool {
        match half {
            LutHalf::Full => self.o6.is_none() && self.o5.is_none() && self.full.is_none(),
            LutHalf::O6 => self.o6.is_none() && self.full.is_none(),
            LutHalf::O5 => self.o5.is_none() && self.full.is_none(),
        }
    }
}

/// A used FF and the pin it was bound through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ff {
    /// Node name of the bound pin.
    pub node: String,
    /// Owning Cut.
    pub cut: CutId,
    /// Usage tag.
    pub usage: Usage,
}

/// A SubLUT to allocate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubLutRequest {
    /// Target LUT.
    pub lut: LutId,
    /// Function.
    pub function: LutFunction,
    /// `(pin, node name)` inputs.
    pub inputs: Vec<(u8, String)>,
    /// Driven CLB output node and whether it is the muxed one.
    pub output: Option<(String, bool)>,
}

impl SubLutRequest {
    /// Occupancy the SubLUT would have.
    pub fn occupancy(&self) -> u8 {
        occupancy(&self.inputs, self.output.as_ref().is_some_and(|(_, m)| *m))
    }

    /// Half the SubLUT would take.
    pub fn half(&self) -> LutHalf {
        match (self.occupancy(), &self.output) {
            (2, _) => LutHalf::Full,
            (_, Some(_)) => LutHalf::O6,
            (_, None) => LutHalf::O5,
        }
    }
}

/// Why an allocation was refused. Refusals leave every table untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AllocError {
    /// Not enough LUT capacity left.
    #[error("{lut} has capacity {available}, needs {needed}")]
    Capacity {
        /// The LUT.
        lut: LutId,
        /// Requested occupancy.
        needed: u8,
        /// Remaining capacity.
        available: u8,
    },
    /// The requested half is occupied.
    #[error("{half:?} of {lut} is taken")]
    HalfTaken {
        /// The LUT.
        lut: LutId,
        /// The half.
        half: LutHalf,
    },
    /// The FF is already bound.
    #[error("{0} is already in use")]
    FfInUse(FfId),
}

/// Journal entry of an allocation change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllocChange {
    /// A LUT entry was created or modified; `prev` is its former value.
    LutChanged {
        /// The LUT.
        id: LutId,
        /// Former value, `None` if it did not exist.
        prev: Option<Lut>,
    },
    /// A SubLUT was appended to the arena.
    SubLutPushed(SubLutId),
    /// An FF entry was created or modified.
    FfChanged {
        /// The FF.
        id: FfId,
        /// Former value.
        prev: Option<Ff>,
    },
}

/// Allocation tables of one configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    luts: BTreeMap<LutId, Lut>,
    subluts: Vec<SubLut>,
    ffs: BTreeMap<FfId, Ff>,
}

impl Allocation {
    /// Empty tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// A LUT, if any Cut touched it.
    pub fn lut(&self, id: &LutId) -> Option<&Lut> {
        self.luts.get(id)
    }

    /// Every touched LUT.
    pub fn luts(&self) -> impl Iterator<Item = (&LutId, &Lut)> {
        self.luts.iter()
    }

    /// A SubLUT.
    pub fn sublut(&self, id: SubLutId) -> &SubLut {
        &self.subluts[id.index()]
    }

    /// Every SubLUT in allocation order.
    pub fn subluts(&self) -> &[SubLut] {
        &self.subluts
    }

    /// An FF, if bound.
    pub fn ff(&self, id: &FfId) -> Option<&Ff> {
        self.ffs.get(id)
    }

    /// Every bound FF.
    pub fn ffs(&self) -> impl Iterator<Item = (&FfId, &Ff)> {
        self.ffs.iter()
    }

    /// Remaining capacity of a LUT.
    pub fn capacity(&self, id: &LutId) -> u8 {
        self.luts.get(id).map_or(LUT_CAPACITY, |l| l.capacity)
    }

    /// Checks a request without allocating.
    pub fn check_sublut(&self, req: &SubLutRequest) -> Result<(), AllocError> {
        let default = Lut::default();
        let lut = self.luts.get(&req.lut).unwrap_or(&default);
        let needed = req.occupancy();
        let available = if lut.usage == Usage::Blocked { 0 } else { lut.capacity };
        if available < needed {
            return Err(AllocError::Capacity {
                lut: req.lut.clone(),
                needed,
                available,
            });
        }
        let half = req.half();
        if !lut.half_free(half) {
            return Err(AllocError::HalfTaken {
                lut: req.lut.clone(),
                half,
            });
        }
        Ok(())
    }

    /// Allocates a SubLUT for `cut`.
    pub fn add_sublut(
        &mut self,
        req: SubLutRequest,
        cut: CutId,
        journal: &mut Journal,
    ) -> Result<SubLutId, AllocError> {
        self.check_sublut(&req)?;
        let id = SubLutId::from_raw(self.subluts.len() as u32);
        let half = req.half();
        let occupancy = req.occupancy();
        let (output, muxed) = match req.output {
            Some((node, muxed)) => (Some(node), muxed),
            None => (None, false),
        };

        let prev = self.luts.get(&req.lut).cloned();
        let mut lut = prev.clone().unwrap_or_default();
        lut.capacity -= occupancy;
        lut.usage = Usage::Used;
        lut.subluts.push(id);
        match half {
            LutHalf::O6 => lut.o6 = Some(id),
            LutHalf::O5 => lut.o5 = Some(id),
            LutHalf::Full => lut.full = Some(id),
        }
        journal.push(Change::Alloc(AllocChange::LutChanged {
            id: req.lut.clone(),
            prev,
        }));
        self.luts.insert(req.lut.clone(), lut);

        self.subluts.push(SubLut {
            lut: req.lut,
            function: req.function,
            inputs: req.inputs,
            output,
            muxed,
            half,
            cut,
            usage: Usage::Used,
        });
        journal.push(Change::Alloc(AllocChange::SubLutPushed(id)));
        Ok(id)
    }

    /// Binds a free FF to `node` for `cut`.
    pub fn use_ff(&mut self, id: FfId, node: &str, cut: CutId, journal: &mut Journal) -> Result<(), AllocError> {
        let prev = self.ffs.get(&id).cloned();
        if prev.as_ref().is_some_and(|ff| ff.usage != Usage::Free) {
            return Err(AllocError::FfInUse(id));
        }
        journal.push(Change::Alloc(AllocChange::FfChanged {
            id: id.clone(),
            prev,
        }));
        self.ffs.insert(
            id,
            Ff {
                node: node.to_string(),
                cut,
                usage: Usage::Used,
            },
        );
        Ok(())
    }

    /// Reverts one journaled change.
    pub(crate) fn undo(&mut self, change: AllocChange) -> PipcovResult<()> {
        match change {
            AllocChange::LutChanged { id, prev } => {
                match prev {
                    Some(lut) => self.luts.insert(id, lut),
                    None => self.luts.remove(&id),
                };
            }
            AllocChange::SubLutPushed(id) => {
                if self.subluts.len() != id.index() + 1 {
                    return Err(InternalError::new(format!(
                        "undoing {id} but the arena holds {} entries",
                        self.subluts.len()
                    )));
                }
                self.subluts.pop();
            }
            AllocChange::FfChanged { id, prev } => {
                match prev {
                    Some(ff) => self.ffs.insert(id, ff),
                    None => self.ffs.remove(&id),
                };
            }
        }
        Ok(())
    }

    /// Tags every used unit blocked for the rest of the configuration.
    pub fn finalize(&mut self) {
        for lut in self.luts.values_mut() {
            if lut.usage == Usage::Used {
                lut.usage = Usage::Blocked;
            }
        }
        for s in &mut self.subluts {
            if s.usage == Usage::Used {
                s.usage = Usage::Blocked;
            }
        }
        for ff in self.ffs.values_mut() {
            if ff.usage == Usage::Used {
                ff.usage = Usage::Blocked;
            }
        }
    }

    /// Returns `true` if every LUT's capacity equals its initial capacity
    /// minus the occupancy of the SubLUTs it holds.
    pub fn capacity_conserved(&self) -> bool {
        self.luts.values().all(|lut| {
            let used: u8 = lut
                .subluts
                .iter()
                .map(|&s| self.subluts.get(s.index()).map_or(0, SubLut::occupancy))
                .sum();
            LUT_CAPACITY.checked_sub(used) == Some(lut.capacity)
        })
    }

    /// 64-bit INIT value of a LUT.
    ///
    /// Bit `i` evaluates input pin `p` as `(i >> (p - 1)) & 1`. An O6
    /// SubLUT fills bits 32..63, an O5 SubLUT bits 0..31, a whole-LUT
    /// SubLUT all 64.
    pub fn truth_table(&self, id: &LutId) -> u64 {
        let Some(lut) = self.luts.get(id) else {
            return 0;
        };
        let mut init = 0u64;
        for &s in &lut.subluts {
            let sub = &self.subluts[s.index()];
            let bits = match sub.half {
                LutHalf::O6 => 32..64,
                LutHalf::O5 => 0..32,
                LutHalf::Full => 0..64,
            };
            for i in bits {
                let value = sub
                    .function
                    .eval(sub.inputs.iter().map(|(pin, _)| (i >> (pin - 1)) & 1 == 1));
                if value {
                    init |= 1u64 << i;
                }
            }
        }
        init
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lut(tile: &str, label: char) -> LutId {
        LutId {
            tile: tile.to_string(),
            label: Label::from_char(label).unwrap(),
        }
    }

    fn req(lut: &LutId, function: LutFunction, pins: &[u8], output: Option<bool>) -> SubLutRequest {
        SubLutRequest {
            lut: lut.clone(),
            function,
            inputs: pins.iter().map(|p| (*p, format!("{}/{}{p}", lut.tile, lut.label))).collect(),
            output: output.map(|muxed| (format!("{}/out", lut.tile), muxed)),
        }
    }

    fn undo_all(alloc: &mut Allocation, journal: &mut Journal) {
        while let Some(change) = journal.pop_after(0) {
            let Change::Alloc(change) = change else {
                panic!("unexpected change");
            };
            alloc.undo(change).unwrap();
        }
    }

    #[test]
    fn halves_and_occupancy() {
        let a = lut("CLEL_R_X0Y0", 'A');
        assert_eq!(req(&a, LutFunction::Buffer, &[1], Some(false)).half(), LutHalf::O6);
        assert_eq!(req(&a, LutFunction::Not, &[2], None).half(), LutHalf::O5);
        assert_eq!(req(&a, LutFunction::Buffer, &[6], Some(false)).half(), LutHalf::Full);
        assert_eq!(req(&a, LutFunction::Buffer, &[1], Some(true)).half(), LutHalf::Full);
        assert_eq!(req(&a, LutFunction::Buffer, &[6], None).occupancy(), 2);
    }

    #[test]
    fn two_halves_fill_a_lut() {
        let a = lut("CLEL_R_X0Y0", 'A');
        let mut alloc = Allocation::new();
        let mut journal = Journal::default();
        let cut = CutId::from_raw(0);
        alloc
            .add_sublut(req(&a, LutFunction::Buffer, &[1], Some(false)), cut, &mut journal)
            .unwrap();
        alloc
            .add_sublut(req(&a, LutFunction::Not, &[2], None), cut, &mut journal)
            .unwrap();
        assert_eq!(alloc.capacity(&a), 0);
        assert!(alloc.capacity_conserved());
        let err = alloc
            .add_sublut(req(&a, LutFunction::Buffer, &[3], Some(false)), cut, &mut journal)
            .unwrap_err();
        assert!(matches!(err, AllocError::Capacity { available: 0, .. }));
    }

    #[test]
    fn occupancy_two_rejected_at_capacity_one() {
        let a = lut("CLEL_R_X0Y0", 'B');
        let mut alloc = Allocation::new();
        let mut journal = Journal::default();
        let cut = CutId::from_raw(0);
        alloc
            .add_sublut(req(&a, LutFunction::Not, &[1], None), cut, &mut journal)
            .unwrap();
        let before = alloc.clone();
        let marks = journal.len();
        let err = alloc
            .add_sublut(req(&a, LutFunction::Buffer, &[6], Some(false)), cut, &mut journal)
            .unwrap_err();
        assert_eq!(
            err,
            AllocError::Capacity {
                lut: a.clone(),
                needed: 2,
                available: 1
            }
        );
        assert_eq!(alloc, before);
        assert_eq!(journal.len(), marks);
    }

    #[test]
    fn same_half_twice_is_rejected() {
        let a = lut("CLEL_R_X0Y0", 'C');
        let mut alloc = Allocation::new();
        let mut journal = Journal::default();
        let cut = CutId::from_raw(0);
        alloc
            .add_sublut(req(&a, LutFunction::Buffer, &[1], Some(false)), cut, &mut journal)
            .unwrap();
        let err = alloc
            .add_sublut(req(&a, LutFunction::Buffer, &[2], Some(false)), cut, &mut journal)
            .unwrap_err();
        assert!(matches!(err, AllocError::HalfTaken { half: LutHalf::O6, .. }));
    }

    #[test]
    fn rollback_restores_tables() {
        let a = lut("CLEL_R_X0Y0", 'D');
        let mut alloc = Allocation::new();
        let mut journal = Journal::default();
        let cut = CutId::from_raw(0);
        let ff = FfId {
            tile: "CLEL_R_X0Y0".into(),
            label: Label::from_char('D').unwrap(),
            index: FfIndex::Primary,
        };
        alloc
            .add_sublut(req(&a, LutFunction::Buffer, &[1], Some(false)), cut, &mut journal)
            .unwrap();
        journal.clear();
        let before = alloc.clone();

        alloc
            .add_sublut(req(&a, LutFunction::Not, &[2], None), CutId::from_raw(1), &mut journal)
            .unwrap();
        alloc.use_ff(ff.clone(), "CLEL_R_X0Y0/DX", CutId::from_raw(1), &mut journal).unwrap();
        assert!(alloc.ff(&ff).is_some());
        undo_all(&mut alloc, &mut journal);
        assert_eq!(alloc, before);
        assert!(alloc.capacity_conserved());
    }

    #[test]
    fn ff_is_single_use() {
        let mut alloc = Allocation::new();
        let mut journal = Journal::default();
        let ff = FfId {
            tile: "CLEM_X0Y0".into(),
            label: Label::from_char('A').unwrap(),
            index: FfIndex::Secondary,
        };
        alloc.use_ff(ff.clone(), "n", CutId::from_raw(0), &mut journal).unwrap();
        assert_eq!(
            alloc.use_ff(ff.clone(), "n", CutId::from_raw(1), &mut journal),
            Err(AllocError::FfInUse(ff.clone()))
        );
        assert_eq!(ff.to_string(), "CLEM_X0Y0/AFF2");
    }

    #[test]
    fn finalize_blocks_used_units() {
        let a = lut("CLEL_R_X0Y0", 'E');
        let mut alloc = Allocation::new();
        let mut journal = Journal::default();
        alloc
            .add_sublut(req(&a, LutFunction::Not, &[1], None), CutId::from_raw(0), &mut journal)
            .unwrap();
        alloc.finalize();
        assert_eq!(alloc.lut(&a).unwrap().usage, Usage::Blocked);
        assert_eq!(alloc.subluts()[0].usage, Usage::Blocked);
        let err = alloc
            .add_sublut(req(&a, LutFunction::Buffer, &[2], Some(false)), CutId::from_raw(1), &mut journal)
            .unwrap_err();
        assert!(matches!(err, AllocError::Capacity { available: 0, .. }));
    }

    #[test]
    fn truth_tables() {
        let a = lut("CLEL_R_X0Y0", 'F');
        let mut alloc = Allocation::new();
        let mut journal = Journal::default();
        let cut = CutId::from_raw(0);
        // Buffer of pin 1 in O6: odd bits of the upper half.
        alloc
            .add_sublut(req(&a, LutFunction::Buffer, &[1], Some(false)), cut, &mut journal)
            .unwrap();
        assert_eq!(alloc.truth_table(&a), 0xAAAA_AAAA_0000_0000);
        // Not of pin 2 in O5: bits whose bit 1 is clear in the lower half.
        alloc
            .add_sublut(req(&a, LutFunction::Not, &[2], None), cut, &mut journal)
            .unwrap();
        assert_eq!(alloc.truth_table(&a), 0xAAAA_AAAA_3333_3333);

        let g = lut("CLEL_R_X0Y0", 'G');
        alloc
            .add_sublut(req(&g, LutFunction::Buffer, &[6], Some(false)), cut, &mut journal)
            .unwrap();
        assert_eq!(alloc.truth_table(&g), 0xFFFF_FFFF_0000_0000);
        assert_eq!(alloc.truth_table(&lut("CLEL_R_X0Y0", 'H')), 0);
    }

    #[test]
    fn xor_parity() {
        assert!(LutFunction::Xor.eval([true, false, false].into_iter()));
        assert!(!LutFunction::Xor.eval([true, true].into_iter()));
        assert!(LutFunction::Not.eval(std::iter::once(false)));
    }
}
