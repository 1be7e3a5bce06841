//! Callbacks module for handling all inline keyboard callback queries
//!
//! This module is organized into submodules for different types of callbacks:
//! - `callback_handler`: Main routing handler for all callback queries
//! - `callback_types`: Callback data carried by the buttons
//! - `quiz_callbacks`: Answer, next, stop and listen buttons of the quiz
//! - `words_callbacks`: Word list pagination and `/clear` confirmation

pub mod callback_handler;
pub mod callback_types;
pub mod quiz_callbacks;
pub mod words_callbacks;
