// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Agent orchestration for Mnemo.
//!
//! A [`Agent::run`] call:
//! 1. flushes durable facts to memory if the conversation nears the model's
//!    context window,
//! 2. builds the system prompt from base behavior, personality, onboarding,
//!    memory and skills,
//! 3. runs the model with the tool registry for at most [`MAX_STEPS`] steps,
//! 4. records [`RunStats`] and logs the exchange to today's daily file.
//!
//! `run` always returns text; failures come back prefixed with `"Error: "`.

pub mod agent;
pub mod run;
mod scheduled;

pub use agent::{Agent, AgentBuilder, DAILY_SUMMARY_MAX_CHARS, MAX_STEPS, NO_MODEL_REPLY};
pub use run::{RunContext, RunStats, ToolUseObserver};
