pub mod convert;
pub mod fragment;
pub mod split;
