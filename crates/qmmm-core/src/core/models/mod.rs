pub mod cell;
pub mod elements;
pub mod selection;
pub mod system;
