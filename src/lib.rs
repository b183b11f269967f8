pub mod booking;
pub mod catalog;
pub mod config;
pub mod customer;
pub mod db;
pub mod engine;
pub mod environment;
pub mod errors;
pub mod guest;
pub mod money;
pub mod normalization;
pub mod policy;
pub mod pricing;
pub mod routes;
pub mod urls;
