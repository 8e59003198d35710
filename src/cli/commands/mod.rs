pub mod inspect;
pub mod suggest;
pub mod train;
