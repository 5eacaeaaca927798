pub(crate) mod sequencer;
