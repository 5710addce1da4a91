// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

pub mod audio;
pub mod error;
pub mod intelligence;
pub mod search;
pub mod settings;
pub mod version;
