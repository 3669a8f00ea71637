pub mod reference;
pub mod table;
