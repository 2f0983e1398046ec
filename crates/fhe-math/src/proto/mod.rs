#![allow(missing_docs)]

pub mod rq;
