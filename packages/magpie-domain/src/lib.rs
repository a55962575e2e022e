pub mod chunk;
pub mod interleave;
pub mod note;
pub mod reference;
pub mod similarity;
pub mod status;
