//! In-memory cache of gateway state.
//!
//! Dispatch payloads are applied to the cache first, then translated into
//! consumer [`Event`]s carrying the entities as they looked before and
//! after the change.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::events::Event;
use crate::gateway::DispatchEvent;
use crate::models::{ClientUser, Guild, GuildId, Member, Role, User, UserId};

/// Thread-safe cache of users and guilds, shared between the dispatcher
/// task and client reads.
#[derive(Clone, Default)]
pub(crate) struct Cache {
    inner: Arc<RwLock<CacheState>>,
}

#[derive(Default)]
struct CacheState {
    current_user: Option<ClientUser>,
    users: HashMap<UserId, User>,
    guilds: HashMap<GuildId, Guild>,
}

impl Cache {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub(crate) fn current_user(&self) -> Option<ClientUser> {
        self.inner
            .read()
            .ok()
            .and_then(|state| state.current_user.clone())
    }

    #[must_use]
    pub(crate) fn get_user(&self, user_id: UserId) -> Option<User> {
        self.inner
            .read()
            .ok()
            .and_then(|state| state.users.get(&user_id).cloned())
    }

    #[must_use]
    pub(crate) fn users(&self) -> Vec<User> {
        self.inner
            .read()
            .ok()
            .map(|state| state.users.values().cloned().collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub(crate) fn get_guild(&self, guild_id: GuildId) -> Option<Guild> {
        self.inner
            .read()
            .ok()
            .and_then(|state| state.guilds.get(&guild_id).cloned())
    }

    #[must_use]
    pub(crate) fn guilds(&self) -> Vec<Guild> {
        self.inner
            .read()
            .ok()
            .map(|state| state.guilds.values().cloned().collect())
            .unwrap_or_default()
    }

    pub(crate) fn clear(&self) {
        if let Ok(mut state) = self.inner.write() {
            *state = CacheState::default();
        }
    }

    /// Applies a dispatch to the cache and returns the events to deliver.
    pub(crate) fn apply(&self, dispatch: DispatchEvent) -> Vec<Event> {
        let Ok(mut state) = self.inner.write() else {
            return Vec::new();
        };

        match dispatch {
            DispatchEvent::Ready(ready) => {
                let client_user = ClientUser::from_data(&ready.user);
                state
                    .users
                    .insert(client_user.id(), client_user.user().clone());
                state.current_user = Some(client_user.clone());
                // Guild stubs in READY are filled in by the GUILD_CREATE
                // dispatches that follow.
                vec![Event::Ready { user: client_user }]
            }

            DispatchEvent::UserUpdate(data) => {
                let after = ClientUser::from_data(&data);
                state.users.insert(after.id(), after.user().clone());
                let before = state.current_user.replace(after.clone());

                before.map_or_else(Vec::new, |before| {
                    vec![Event::UserUpdate { before, after }]
                })
            }

            DispatchEvent::GuildCreate(data) => {
                // An outage placeholder, not a join.
                if data.unavailable == Some(true) {
                    debug!(guild_id = %data.id, "Ignoring unavailable guild");
                    return Vec::new();
                }

                let guild = Guild::from_data(&data);
                state.guilds.insert(guild.id(), guild.clone());

                // A guild coming back from an outage is announced as
                // available first, but still counts as a join.
                let mut events = Vec::with_capacity(2);
                if data.unavailable == Some(false) {
                    events.push(Event::GuildAvailable(guild.clone()));
                }
                events.push(Event::GuildJoin(guild));
                events
            }

            DispatchEvent::GuildUpdate(data) => {
                let Some(guild) = state.guilds.get_mut(&data.id) else {
                    debug!(guild_id = %data.id, "Update for unknown guild");
                    return Vec::new();
                };

                let before = guild.clone();
                guild.update_from_data(&data);
                let after = guild.clone();
                vec![Event::GuildUpdate { before, after }]
            }

            DispatchEvent::GuildDelete(payload) => {
                // The guild leaves the cache either way; a truthy
                // `unavailable` marks an outage rather than a removal,
                // and the guild comes back via GUILD_CREATE.
                let removed = state.guilds.remove(&payload.id);

                if payload.unavailable.unwrap_or(false) {
                    debug!(guild_id = %payload.id, "Guild became unavailable");
                    return Vec::new();
                }

                removed.map_or_else(Vec::new, |guild| vec![Event::GuildLeave(guild)])
            }

            DispatchEvent::MemberAdd(payload) => {
                let Some(guild) = state.guilds.get_mut(&payload.guild_id) else {
                    return Vec::new();
                };

                let member = Member::from_data(payload.guild_id, &payload.member);
                guild.insert_member(member.clone());
                state.users.insert(member.id(), member.user().clone());
                vec![Event::MemberJoin(member)]
            }

            DispatchEvent::MemberUpdate(payload) => {
                let Some(guild) = state.guilds.get_mut(&payload.guild_id) else {
                    return Vec::new();
                };

                let after = Member::from_data(payload.guild_id, &payload.member);
                let before = guild.get_member(after.id()).cloned();
                guild.insert_member(after.clone());

                before.map_or_else(Vec::new, |before| {
                    vec![Event::MemberUpdate { before, after }]
                })
            }

            DispatchEvent::MemberRemove(payload) => {
                let Some(guild) = state.guilds.get_mut(&payload.guild_id) else {
                    return Vec::new();
                };

                let user = User::from_data(&payload.user);
                guild.remove_member(user.id());
                vec![Event::MemberRemove {
                    guild_id: payload.guild_id,
                    user,
                }]
            }

            DispatchEvent::RoleCreate(payload) => {
                let Some(guild) = state.guilds.get_mut(&payload.guild_id) else {
                    return Vec::new();
                };

                let role = Role::from_data(&payload.role);
                guild.insert_role(role.clone());
                vec![Event::RoleCreate {
                    guild_id: payload.guild_id,
                    role,
                }]
            }

            DispatchEvent::RoleUpdate(payload) => {
                let Some(guild) = state.guilds.get_mut(&payload.guild_id) else {
                    return Vec::new();
                };

                let after = Role::from_data(&payload.role);
                let before = guild.get_role(after.id()).cloned();
                guild.insert_role(after.clone());

                before.map_or_else(Vec::new, |before| {
                    vec![Event::RoleUpdate {
                        guild_id: payload.guild_id,
                        before,
                        after,
                    }]
                })
            }

            DispatchEvent::RoleDelete(payload) => {
                let Some(guild) = state.guilds.get_mut(&payload.guild_id) else {
                    return Vec::new();
                };

                guild.remove_role(payload.role_id).map_or_else(Vec::new, |role| {
                    vec![Event::RoleDelete {
                        guild_id: payload.guild_id,
                        role,
                    }]
                })
            }

            DispatchEvent::Unknown { event_type } => {
                debug!(event = %event_type, "Ignoring unhandled dispatch");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::DispatchEvent;

    fn ready_dispatch() -> DispatchEvent {
        DispatchEvent::Ready(
            serde_json::from_value(serde_json::json!({
                "session_id": "sess",
                "resume_gateway_url": null,
                "user": {
                    "id": "1",
                    "username": "bot",
                    "discriminator": "0000",
                    "bot": true,
                    "verified": true
                },
                "guilds": [{"id": "100", "unavailable": true}]
            }))
            .unwrap(),
        )
    }

    fn guild_create(id: &str, unavailable: Option<bool>) -> DispatchEvent {
        let mut value = serde_json::json!({
            "id": id,
            "name": "Test Guild",
            "members": [
                {"user": {"id": "10", "username": "a", "discriminator": "0001"}}
            ],
            "roles": [
                {"id": id, "name": "@everyone", "position": 0}
            ]
        });
        if let Some(flag) = unavailable {
            value["unavailable"] = serde_json::Value::Bool(flag);
        }
        DispatchEvent::GuildCreate(serde_json::from_value(value).unwrap())
    }

    #[test]
    fn test_ready_stores_client_user() {
        let cache = Cache::new();
        let events = cache.apply(ready_dispatch());

        assert!(matches!(events.as_slice(), [Event::Ready { .. }]));
        let current = cache.current_user().unwrap();
        assert_eq!(current.username(), "bot");
        assert!(current.verified());
        assert!(cache.get_user(UserId::from(1_u64)).is_some());
    }

    #[test]
    fn test_guild_create_join_and_available() {
        let cache = Cache::new();

        let events = cache.apply(guild_create("100", None));
        assert!(matches!(events.as_slice(), [Event::GuildJoin(_)]));
        assert!(cache.get_guild(GuildId::from(100_u64)).is_some());

        // Back from an outage: available, then the unconditional join.
        let events = cache.apply(guild_create("100", Some(false)));
        assert!(matches!(
            events.as_slice(),
            [Event::GuildAvailable(_), Event::GuildJoin(_)]
        ));
    }

    #[test]
    fn test_guild_create_outage_placeholder_ignored() {
        let cache = Cache::new();
        let events = cache.apply(guild_create("100", Some(true)));
        assert!(events.is_empty());
        assert!(cache.get_guild(GuildId::from(100_u64)).is_none());
    }

    #[test]
    fn test_guild_delete_outage_drops_guild_without_leave() {
        let cache = Cache::new();
        cache.apply(guild_create("100", None));

        let dispatch = DispatchEvent::GuildDelete(
            serde_json::from_value(serde_json::json!({"id": "100", "unavailable": true})).unwrap(),
        );
        let events = cache.apply(dispatch);

        assert!(events.is_empty());
        assert!(cache.get_guild(GuildId::from(100_u64)).is_none());
    }

    #[test]
    fn test_guild_delete_removal_emits_leave() {
        let cache = Cache::new();
        cache.apply(guild_create("100", None));

        let dispatch = DispatchEvent::GuildDelete(
            serde_json::from_value(serde_json::json!({"id": "100"})).unwrap(),
        );
        let events = cache.apply(dispatch);

        assert!(matches!(events.as_slice(), [Event::GuildLeave(_)]));
        assert!(cache.get_guild(GuildId::from(100_u64)).is_none());
    }

    #[test]
    fn test_member_add_populates_user_cache() {
        let cache = Cache::new();
        cache.apply(guild_create("100", None));

        let dispatch = DispatchEvent::MemberAdd(
            serde_json::from_value(serde_json::json!({
                "guild_id": "100",
                "user": {"id": "20", "username": "newbie", "discriminator": "0002"}
            }))
            .unwrap(),
        );
        let events = cache.apply(dispatch);

        assert!(matches!(events.as_slice(), [Event::MemberJoin(_)]));
        assert!(cache.get_user(UserId::from(20_u64)).is_some());
        let guild = cache.get_guild(GuildId::from(100_u64)).unwrap();
        assert!(guild.get_member(UserId::from(20_u64)).is_some());
    }

    #[test]
    fn test_member_events_for_unknown_guild_ignored() {
        let cache = Cache::new();

        let dispatch = DispatchEvent::MemberAdd(
            serde_json::from_value(serde_json::json!({
                "guild_id": "999",
                "user": {"id": "20", "username": "newbie", "discriminator": "0002"}
            }))
            .unwrap(),
        );
        assert!(cache.apply(dispatch).is_empty());
    }

    #[test]
    fn test_member_update_carries_before_and_after() {
        let cache = Cache::new();
        cache.apply(guild_create("100", None));

        let dispatch = DispatchEvent::MemberUpdate(
            serde_json::from_value(serde_json::json!({
                "guild_id": "100",
                "user": {"id": "10", "username": "a", "discriminator": "0001"},
                "nick": "renamed"
            }))
            .unwrap(),
        );
        let events = cache.apply(dispatch);

        match events.as_slice() {
            [Event::MemberUpdate { before, after }] => {
                assert!(before.nick().is_none());
                assert_eq!(after.nick(), Some("renamed"));
            }
            other => panic!("unexpected events: {other:?}"),
        }
    }

    #[test]
    fn test_member_update_unknown_member_inserted_silently() {
        let cache = Cache::new();
        cache.apply(guild_create("100", None));

        let dispatch = DispatchEvent::MemberUpdate(
            serde_json::from_value(serde_json::json!({
                "guild_id": "100",
                "user": {"id": "55", "username": "ghost", "discriminator": "0005"}
            }))
            .unwrap(),
        );
        let events = cache.apply(dispatch);

        assert!(events.is_empty());
        let guild = cache.get_guild(GuildId::from(100_u64)).unwrap();
        assert!(guild.get_member(UserId::from(55_u64)).is_some());
    }

    #[test]
    fn test_role_lifecycle() {
        let cache = Cache::new();
        cache.apply(guild_create("100", None));

        let create = DispatchEvent::RoleCreate(
            serde_json::from_value(serde_json::json!({
                "guild_id": "100",
                "role": {"id": "200", "name": "mods", "position": 3}
            }))
            .unwrap(),
        );
        assert!(matches!(
            cache.apply(create).as_slice(),
            [Event::RoleCreate { .. }]
        ));

        let update = DispatchEvent::RoleUpdate(
            serde_json::from_value(serde_json::json!({
                "guild_id": "100",
                "role": {"id": "200", "name": "admins", "position": 3}
            }))
            .unwrap(),
        );
        match cache.apply(update).as_slice() {
            [Event::RoleUpdate { before, after, .. }] => {
                assert_eq!(before.name(), "mods");
                assert_eq!(after.name(), "admins");
            }
            other => panic!("unexpected events: {other:?}"),
        }

        let delete = DispatchEvent::RoleDelete(
            serde_json::from_value(serde_json::json!({"guild_id": "100", "role_id": "200"}))
                .unwrap(),
        );
        match cache.apply(delete).as_slice() {
            [Event::RoleDelete { role, .. }] => assert_eq!(role.name(), "admins"),
            other => panic!("unexpected events: {other:?}"),
        }
    }

    #[test]
    fn test_role_delete_unknown_role_emits_nothing() {
        let cache = Cache::new();
        cache.apply(guild_create("100", None));

        let delete = DispatchEvent::RoleDelete(
            serde_json::from_value(serde_json::json!({"guild_id": "100", "role_id": "999"}))
                .unwrap(),
        );
        assert!(cache.apply(delete).is_empty());
    }

    #[test]
    fn test_user_update_replaces_client_user() {
        let cache = Cache::new();
        cache.apply(ready_dispatch());

        let dispatch = DispatchEvent::UserUpdate(
            serde_json::from_value(serde_json::json!({
                "id": "1",
                "username": "renamed",
                "discriminator": "0000",
                "bot": true
            }))
            .unwrap(),
        );
        let events = cache.apply(dispatch);

        match events.as_slice() {
            [Event::UserUpdate { before, after }] => {
                assert_eq!(before.username(), "bot");
                assert_eq!(after.username(), "renamed");
            }
            other => panic!("unexpected events: {other:?}"),
        }
        assert_eq!(cache.current_user().unwrap().username(), "renamed");
    }

    #[test]
    fn test_clear_empties_everything() {
        let cache = Cache::new();
        cache.apply(ready_dispatch());
        cache.apply(guild_create("100", None));

        cache.clear();

        assert!(cache.current_user().is_none());
        assert!(cache.users().is_empty());
        assert!(cache.guilds().is_empty());
    }
}
