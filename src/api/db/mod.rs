pub mod handlers;
pub mod structures;

pub use handlers::{
    get_integration_session, init_routes, list_chats, list_contacts, list_instances, list_media,
    list_messages, update_chat_ai, update_chat_unread, update_messages_status,
};
