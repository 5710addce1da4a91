// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Route handlers for the HTTP API.

pub mod audio;

pub use audio::{audio_router, AudioApiDoc, AudioState};
