// Copyright 2017 Kisio Digital and/or its affiliates.
//
// This program is free software: you can redistribute it and/or
// modify it under the terms of the GNU General Public License as
// published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful, but
// WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU
// General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see
// <http://www.gnu.org/licenses/>.

//! The `avl_ppc` crate implements the AVL post-publishing check for bus open
//! data: it samples live vehicle activities from a SIRI-VM feed, resolves each
//! one to the single scheduled vehicle journey it corresponds to in the
//! published [TransXChange](https://www.gov.uk/government/collections/transxchange)
//! timetables, and compares a fixed set of fields between the live report and
//! the schedule.
//!
//! Retrieval of feed and timetable bytes, persistence and report compilation
//! are collaborators behind traits; the engine itself performs no I/O.

#![deny(missing_docs)]

mod batch;
pub mod finder;
pub mod locator;
pub mod matcher;
mod minidom_utils;
pub mod objects;
pub mod sampler;
pub mod siri;
pub mod transxchange;
pub mod validation;

/// The error type used by the crate.
pub type Error = anyhow::Error;

/// The corresponding result type used by the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

pub use crate::batch::run_batch;
