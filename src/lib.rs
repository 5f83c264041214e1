//! # workpipe
//!
//! A master/worker pipeline over a Redis list queue.
//!
//! The master ([`producer::Producer`]) pushes JSON work items; workers
//! ([`consumer::Consumer`]) pop them with a blocking pop and write one
//! result file per item under `<RESULT_FOLDER>/<worker>/<producer>/<file>`.

pub mod codec;
pub mod config;
pub mod consumer;
pub mod error;
pub mod model;
pub mod producer;
pub mod queue;
pub mod telemetry;
