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

//! Collaborator interface locating published timetable files that could
//! contain the scheduled trip an activity corresponds to.

use crate::Result;

/// One published, live-revision timetable file returned by the locator.
#[derive(Debug, Clone)]
pub struct CandidateFile {
    /// Identifier of the dataset the file belongs to.
    pub dataset_id: i64,
    /// Name of the file inside the dataset.
    pub filename: String,
    /// Revision number of the dataset.
    pub revision_number: u32,
    /// Raw XML content of the file.
    pub content: String,
}

/// Lookup of published timetable files by operator code and line name.
///
/// Implementors must restrict results to published, non-draft datasets of
/// active organisations; the matching engine applies no such filter itself.
pub trait CandidateFileLocator {
    /// All published files whose operator code and line name match.
    fn find_candidate_files(
        &self,
        operator_code: &str,
        published_line_name: &str,
    ) -> Result<Vec<CandidateFile>>;
}
