// Pinnacle IO - Treatment planning record codec
//
// Copyright (c) 2025 Dweve IP B.V. and individual contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Malformed record fixtures.

/// Ten `Poi` records of which the fifth lacks a `;`.
pub fn points_one_malformed() -> String {
    let mut text = String::new();
    for i in 0..10 {
        if i == 4 {
            text.push_str("Poi ={\n  Name = \"P4\"\n  XCoord = 4;\n};\n");
        } else {
            text.push_str(&format!("Poi ={{\n  Name = \"P{i}\";\n  XCoord = {i};\n}};\n"));
        }
    }
    text
}

/// Samples that do not parse cleanly, as (name, text).
pub fn invalid_samples() -> Vec<(&'static str, &'static str)> {
    vec![
        ("missing_semi", "A = 1\nB = 2;"),
        ("missing_rbrace", "Trial ={ Name = \"T\";\n"),
        ("stray_rbrace", "A = 1; };"),
        ("unterminated_string", "Name = \"open;"),
        ("invalid_escape", "Name = \"bad\\q\";"),
        ("unterminated_comment", "A = 1; /* open"),
        ("missing_equals", "Name \"T\";"),
        ("control_byte", "A = \u{1};"),
    ]
}
