pub mod badges;
pub mod challenge;
pub mod config;
pub mod freshness;
pub mod learner;
pub mod plan;
pub mod practice;
pub mod streak;
