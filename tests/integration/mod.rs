// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod archive_run_test;
pub mod content_run_test;
pub mod helpers;
pub mod offline_run_test;
pub mod shutdown_test;
