//! Corrected sample arena
//!
//! One slot per tick. A slot starts `Provisional` and becomes `Finalized`
//! exactly once, either unchanged or with a single repaired value. Finalized
//! slots are immutable. Old finalized slots may be evicted to bound memory;
//! indices stay absolute tick numbers regardless of eviction.

use eod_core::{CorrectedSample, EodError, EodResult};
use std::collections::VecDeque;

/// Lifecycle state of a corrected slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Provisional,
    Finalized,
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    value: i32,
    state: SlotState,
}

/// Append-only, index-addressable buffer of corrected samples
#[derive(Debug, Clone)]
pub struct CorrectedBuffer {
    slots: VecDeque<Slot>,
    evicted: u64,
    finalized: u64,
    retention: Option<usize>,
}

impl CorrectedBuffer {
    /// Buffer that keeps every slot
    pub fn new() -> Self {
        Self {
            slots: VecDeque::new(),
            evicted: 0,
            finalized: 0,
            retention: None,
        }
    }

    /// Buffer that keeps at most `retention` slots
    pub fn with_retention(retention: usize) -> Self {
        Self {
            slots: VecDeque::with_capacity(retention + 1),
            retention: Some(retention.max(1)),
            ..Self::new()
        }
    }

    /// Number of slots ever written
    pub fn len(&self) -> u64 {
        self.evicted + self.slots.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of finalized slots ever written
    pub fn finalized_count(&self) -> u64 {
        self.finalized
    }

    /// Append a provisional value and return its index
    pub fn push_provisional(&mut self, value: i32) -> u64 {
        let index = self.len();
        self.slots.push_back(Slot {
            value,
            state: SlotState::Provisional,
        });

        if let Some(retention) = self.retention {
            while self.slots.len() > retention {
                match self.slots.front() {
                    Some(slot) if slot.state == SlotState::Finalized => {
                        self.slots.pop_front();
                        self.evicted += 1;
                    }
                    _ => break,
                }
            }
        }

        index
    }

    fn position(&self, index: u64) -> EodResult<usize> {
        if index < self.evicted || index >= self.len() {
            return Err(EodError::SlotOutOfRange {
                index,
                len: self.len(),
            });
        }
        Ok((index - self.evicted) as usize)
    }

    /// Sample at `index` regardless of state
    pub fn get(&self, index: u64) -> EodResult<CorrectedSample> {
        let slot = self.slots[self.position(index)?];
        Ok(CorrectedSample {
            index,
            value: slot.value,
        })
    }

    /// State of the slot at `index`
    pub fn state(&self, index: u64) -> EodResult<SlotState> {
        Ok(self.slots[self.position(index)?].state)
    }

    /// Value at `index`, which must already be finalized
    pub fn finalized_value(&self, index: u64) -> EodResult<i32> {
        let slot = self.slots[self.position(index)?];
        match slot.state {
            SlotState::Finalized => Ok(slot.value),
            SlotState::Provisional => Err(EodError::SlotNotFinalized { index }),
        }
    }

    /// Finalize the slot at `index` with its current value
    pub fn finalize(&mut self, index: u64) -> EodResult<i32> {
        let position = self.position(index)?;
        let slot = &mut self.slots[position];
        if slot.state == SlotState::Finalized {
            return Err(EodError::SlotAlreadyFinalized { index });
        }
        slot.state = SlotState::Finalized;
        self.finalized += 1;
        Ok(slot.value)
    }

    /// Replace the provisional value at `index` and finalize it
    pub fn rewrite_and_finalize(&mut self, index: u64, value: i32) -> EodResult<()> {
        let position = self.position(index)?;
        let slot = &mut self.slots[position];
        if slot.state == SlotState::Finalized {
            return Err(EodError::SlotAlreadyFinalized { index });
        }
        slot.value = value;
        slot.state = SlotState::Finalized;
        self.finalized += 1;
        Ok(())
    }

    /// Values of `count` consecutive slots ending just before `end`
    pub fn window(&self, end: u64, count: usize) -> EodResult<Vec<i32>> {
        let count = count as u64;
        if count == 0 {
            return Ok(Vec::new());
        }
        if end < count {
            return Err(EodError::SlotOutOfRange {
                index: 0,
                len: self.len(),
            });
        }
        let start = self.position(end - count)?;
        let last = self.position(end - 1)?;
        Ok(self.slots.range(start..=last).map(|slot| slot.value).collect())
    }
}

impl Default for CorrectedBuffer {
    fn default() -> Self {
        Self::new()
    }
}
