//! Flutter bridge for the ThoughtCanvas+ core.

pub mod api;
