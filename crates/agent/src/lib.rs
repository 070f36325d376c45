//! Conversational front door for the ordering flow.
//!
//! This crate turns guest language into structured requests and agent replies
//! into UI state:
//!
//! 1. **Request parsing** (`parser`) - lexical Russian-text classifier that
//!    maps a free-form request to a [`smartmenu_core::GuestIntent`]
//! 2. **Context building** (`context`) - renders the catalog into the text
//!    blob the external conversational agent receives as grounding
//! 3. **UI-action extraction** (`ui_action`) - recognizes the delimited
//!    payload block embedded in agent replies and maps it to a picker model
//! 4. **Session orchestration** (`session`, `transport`) - an explicit state
//!    machine over inbound transport events with idempotent teardown
//!
//! The classifier is deliberately not a language model: every trigger phrase
//! is a fixed lexicon entry, so behavior is reviewable and parsing never
//! fails. Unrecognized input degrades to defaults instead of erroring.

pub mod context;
pub mod parser;
pub mod session;
pub mod transport;
pub mod ui_action;

pub use context::{build_menu_context, menu_reference_lines};
pub use parser::parse_request;
pub use session::{drive_session, SessionAction, SessionEvent, SessionState, VoiceSession};
pub use transport::{ConversationTransport, NoopTransport};
pub use ui_action::{
    extract_ui_action, render_picker_action, strip_ui_actions, MenuPicker, PickerItem,
    PickerVariant, OPEN_MENU_PICKER,
};
