pub mod deploy;
pub mod run;
