pub mod initialize;
pub mod inspect;
pub mod run;
