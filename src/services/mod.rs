pub mod controller;
pub mod operation;
pub mod runner;
pub mod search;
pub mod settings;
pub mod timer;
pub mod validation;
