mod login;
mod resource_list;

pub use login::LoginView;
pub use resource_list::ResourceListView;
