// Engine module - STATE TRANSITIONS

mod transition;

pub use transition::{DepositRequest, MergeOutcome, SpendOutcome, TransitionEngine};
