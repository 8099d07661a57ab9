//! Cross-subsystem flows driven block by block.

#[cfg(test)]
mod harness;
#[cfg(test)]
mod pulses;
#[cfg(test)]
mod rotation;
