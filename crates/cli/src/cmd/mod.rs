pub mod index;
pub mod inspect;
