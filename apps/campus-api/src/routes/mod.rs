pub mod announcements;
pub mod auth;
pub mod events;
pub mod groups;
pub mod health;
pub mod messages;
pub mod notifications;
pub mod pins;
pub mod posts;
pub mod users;

use axum::Router;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(crate::gateway::server::router())
        .nest(
            "/api/v1",
            auth::router()
                .merge(users::router())
                .merge(announcements::router())
                .merge(events::router())
                .merge(groups::router())
                .merge(messages::router())
                .merge(pins::router())
                .merge(posts::router())
                .merge(notifications::router()),
        )
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        // Health
        health::health,
        // Auth
        auth::register,
        auth::login,
        auth::logout,
        // Users
        users::get_me,
        users::update_me,
        users::get_preferences,
        users::update_preferences,
        // Announcements
        announcements::list_announcements,
        announcements::create_announcement,
        // Events
        events::list_events,
        events::create_event,
        events::register,
        events::unregister,
        events::cancel_event,
        // Groups
        groups::create_group,
        groups::list_groups,
        groups::get_group,
        groups::delete_group,
        groups::join_group,
        groups::leave_group,
        groups::change_member_role,
        // Messages
        messages::list_messages,
        messages::send_message,
        messages::edit_message,
        messages::delete_message,
        messages::like_message,
        messages::react_to_message,
        // Pins
        pins::list_pins,
        pins::pin_message,
        pins::unpin_message,
        // Posts
        posts::list_posts,
        posts::create_post,
        posts::delete_post,
        posts::like_post,
        // Notifications
        notifications::list_notifications,
        notifications::mark_read,
        notifications::mark_all_read,
    ),
    components(
        schemas(
            // Error types
            crate::error::ApiErrorBody,
            crate::error::ApiErrorDetail,
            crate::error::FieldError,
            // Models
            crate::models::user::User,
            crate::models::user::PlatformRole,
            crate::models::user::NotificationPreferences,
            crate::models::group::Group,
            crate::models::group::GroupRole,
            crate::models::message::Message,
            crate::models::post::GroupPost,
            crate::models::event::Event,
            crate::models::announcement::Announcement,
            crate::models::announcement::Priority,
            crate::models::notification::Notification,
            crate::models::notification::NotificationType,
            crate::models::notification::ReminderType,
            // Route request/response types
            health::HealthResponse,
            auth::RegisterRequest,
            auth::LoginRequest,
            auth::AuthResponse,
            users::UpdateMeRequest,
            announcements::CreateAnnouncementRequest,
            events::CreateEventRequest,
            groups::CreateGroupRequest,
            groups::ChangeRoleRequest,
            messages::SendMessageRequest,
            messages::EditMessageRequest,
            messages::ReactionRequest,
            posts::CreatePostRequest,
            notifications::MarkAllReadResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check"),
        (name = "Auth", description = "Authentication"),
        (name = "Users", description = "Profile and notification preferences"),
        (name = "Announcements", description = "Campus announcements"),
        (name = "Events", description = "Campus events and registration"),
        (name = "Groups", description = "Group directory and membership"),
        (name = "Messages", description = "Group chat"),
        (name = "Pins", description = "Message pinning"),
        (name = "Posts", description = "Group post feed"),
        (name = "Notifications", description = "Notification inbox"),
    )
)]
pub struct ApiDoc;
