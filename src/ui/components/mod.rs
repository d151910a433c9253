mod command_input;
mod confirm_dialog;
mod detail_modal;
mod form_modal;
mod input;
mod key_result;
mod pagination;
mod search_input;
mod toast;

pub use command_input::{CommandEvent, CommandInput};
pub use confirm_dialog::{ConfirmDialog, ConfirmEvent};
pub use detail_modal::{DetailEvent, DetailModal};
pub use form_modal::{FormEvent, FormModal};
pub use input::{InputResult, TextInput};
pub use key_result::KeyResult;
pub use pagination::PaginationControl;
pub use search_input::{SearchEvent, SearchInput};
pub use toast::{Notification, ToastLevel, Toasts};
