#![allow(dead_code)]

pub mod faulty_api;
pub mod object_server;
