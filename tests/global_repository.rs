// Copyright 2024 FastLabs Developers
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

use hierlog::Level;
use hierlog::LocationInfo;
use hierlog::Log;
use hierlog::repository::Repository;

// The only test of this binary, so the global repository is untouched when it starts.
#[test]
fn test_global_repository_is_configured_on_first_access() {
    let early = Log::in_repository(Repository::global(), "early");
    early
        .log_msg(Level::INFO, LocationInfo::default(), "before the default logger")
        .unwrap();

    let root = Repository::global().root();
    assert_eq!(root.appender_count(), 1);
    assert_eq!(root.level(), Some(Level::INFO));
    assert!(early.is_info_enabled());
    assert!(!early.is_debug_enabled());

    // the default logger lives in the same, already configured repository
    assert_eq!(hierlog::default_logger(), Log::root());
    assert_eq!(Log::root().node().appender_count(), 1);
}
