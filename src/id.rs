// Copyright 2022 jmjoy
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Session id generation.

use std::collections::VecDeque;
use uuid::Uuid;

/// Source of fresh session ids.
pub trait GenerateSessionId {
    fn generate(&mut self) -> String;
}

/// Random 128-bit ids in canonical UUID form.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomSessionId;

impl GenerateSessionId for RandomSessionId {
    fn generate(&mut self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Hands out a fixed sequence of ids, then repeats the last one.
///
/// Meant for tests and reproducible output.
#[derive(Debug, Clone)]
pub struct FixedSessionId {
    ids: VecDeque<String>,
    last: String,
}

impl FixedSessionId {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
            last: String::new(),
        }
    }
}

impl GenerateSessionId for FixedSessionId {
    fn generate(&mut self) -> String {
        if let Some(id) = self.ids.pop_front() {
            self.last = id;
        }
        self.last.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_ids_are_canonical_and_distinct() {
        let mut generator = RandomSessionId;
        let a = generator.generate();
        let b = generator.generate();

        assert_eq!(a.len(), 36);
        assert!(Uuid::parse_str(&a).is_ok());
        assert_ne!(a, b);
    }

    #[test]
    fn test_fixed_ids_in_order() {
        let mut generator = FixedSessionId::new(["one", "two"]);
        assert_eq!(generator.generate(), "one");
        assert_eq!(generator.generate(), "two");
        assert_eq!(generator.generate(), "two");
    }
}
