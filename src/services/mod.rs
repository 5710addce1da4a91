// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

pub mod audio;
pub mod cache;
pub mod confidence;
pub mod intelligence;
pub mod logging;
pub mod orchestrator;
pub mod playback;
pub mod render;
pub mod search;
pub mod transform;
