pub mod action;
pub mod decision;
pub mod message;
pub mod plan;
