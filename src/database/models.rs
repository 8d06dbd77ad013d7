//! SeaORM entities over the shared messaging schema. Ownership of these
//! tables lives in the external messaging system; the gateway only reads and
//! performs narrowly-scoped updates.

// --- Companies ---
pub mod companies {
    use sea_orm::entity::prelude::*;
    use serde::{Deserialize, Serialize};
    use utoipa::ToSchema;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
    #[sea_orm(table_name = "Company")]
    #[schema(as = Company)]
    #[serde(rename_all = "camelCase")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: String,
        pub name: String,
        /// Agent-service ports assigned to this tenant, as stored upstream.
        #[sea_orm(column_name = "agnoPorts")]
        pub agno_ports: Option<Json>,
        #[sea_orm(column_name = "createdAt")]
        #[schema(value_type = Option<String>, format = DateTime)]
        pub created_at: Option<DateTimeUtc>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(has_many = "super::instances::Entity")]
        Instances,
        #[sea_orm(has_many = "super::api_keys::Entity")]
        ApiKeys,
    }

    impl Related<super::instances::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Instances.def()
        }
    }

    impl Related<super::api_keys::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::ApiKeys.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

// --- API keys ---
pub mod api_keys {
    use sea_orm::entity::prelude::*;
    use serde::{Deserialize, Serialize};
    use utoipa::ToSchema;

    /// Credential record. Only the one-way digest of the secret is stored;
    /// a request authenticates by hashing its raw key and matching a
    /// non-revoked row.
    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
    #[sea_orm(table_name = "ApiKey")]
    #[schema(as = ApiKey)]
    #[serde(rename_all = "camelCase")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: String,
        #[sea_orm(column_name = "keyHash", unique)]
        pub key_hash: String,
        #[sea_orm(column_name = "companyId")]
        pub company_id: String,
        #[sea_orm(column_name = "revokedAt")]
        #[schema(value_type = Option<String>, format = DateTime)]
        pub revoked_at: Option<DateTimeUtc>,
        #[sea_orm(column_name = "createdAt")]
        #[schema(value_type = Option<String>, format = DateTime)]
        pub created_at: Option<DateTimeUtc>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::companies::Entity",
            from = "Column::CompanyId",
            to = "super::companies::Column::Id"
        )]
        Company,
    }

    impl Related<super::companies::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Company.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

// --- Instances ---
pub mod instances {
    use sea_orm::entity::prelude::*;
    use serde::{Deserialize, Serialize};
    use utoipa::ToSchema;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
    #[sea_orm(table_name = "Instance")]
    #[schema(as = Instance)]
    #[serde(rename_all = "camelCase")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: String,
        pub name: String,
        #[sea_orm(column_name = "connectionStatus")]
        pub connection_status: Option<String>,
        #[sea_orm(column_name = "companyId")]
        pub company_id: String,
        #[sea_orm(column_name = "createdAt")]
        #[schema(value_type = Option<String>, format = DateTime)]
        pub created_at: Option<DateTimeUtc>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::companies::Entity",
            from = "Column::CompanyId",
            to = "super::companies::Column::Id"
        )]
        Company,
        #[sea_orm(has_many = "super::chats::Entity")]
        Chats,
        #[sea_orm(has_many = "super::messages::Entity")]
        Messages,
        #[sea_orm(has_many = "super::contacts::Entity")]
        Contacts,
    }

    impl Related<super::companies::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Company.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

// --- Chats ---
pub mod chats {
    use sea_orm::entity::prelude::*;
    use serde::{Deserialize, Serialize};
    use utoipa::ToSchema;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
    #[sea_orm(table_name = "Chat")]
    #[schema(as = Chat)]
    #[serde(rename_all = "camelCase")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: String,
        #[sea_orm(column_name = "remoteJid")]
        pub remote_jid: String,
        pub name: Option<String>,
        #[sea_orm(column_name = "unreadMessages")]
        pub unread_messages: i32,
        #[sea_orm(column_name = "aiEnabled")]
        pub ai_enabled: bool,
        pub labels: Option<Json>,
        #[sea_orm(column_name = "instanceId")]
        pub instance_id: String,
        #[sea_orm(column_name = "createdAt")]
        #[schema(value_type = Option<String>, format = DateTime)]
        pub created_at: Option<DateTimeUtc>,
        #[sea_orm(column_name = "updatedAt")]
        #[schema(value_type = Option<String>, format = DateTime)]
        pub updated_at: Option<DateTimeUtc>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::instances::Entity",
            from = "Column::InstanceId",
            to = "super::instances::Column::Id"
        )]
        Instance,
    }

    impl Related<super::instances::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Instance.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

// --- Messages ---
pub mod messages {
    use sea_orm::entity::prelude::*;
    use serde::{Deserialize, Serialize};
    use utoipa::ToSchema;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
    #[sea_orm(table_name = "Message")]
    #[schema(as = Message)]
    #[serde(rename_all = "camelCase")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: String,
        /// Structured key: `remoteJid` of the chat plus its alternate form
        /// (`remoteJidAlt`) and direction flags.
        pub key: Json,
        #[sea_orm(column_name = "pushName")]
        pub push_name: Option<String>,
        pub message: Option<Json>,
        #[sea_orm(column_name = "messageType")]
        pub message_type: Option<String>,
        /// Epoch seconds, as delivered by the messaging system.
        #[sea_orm(column_name = "messageTimestamp")]
        pub message_timestamp: i64,
        pub status: Option<String>,
        pub source: Option<String>,
        #[sea_orm(column_name = "sessionId")]
        pub session_id: Option<String>,
        #[sea_orm(column_name = "instanceId")]
        pub instance_id: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::instances::Entity",
            from = "Column::InstanceId",
            to = "super::instances::Column::Id"
        )]
        Instance,
        #[sea_orm(
            belongs_to = "super::integration_sessions::Entity",
            from = "Column::SessionId",
            to = "super::integration_sessions::Column::Id"
        )]
        IntegrationSession,
        #[sea_orm(has_many = "super::media::Entity")]
        Media,
    }

    impl Related<super::instances::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Instance.def()
        }
    }

    impl Related<super::media::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Media.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

// --- Contacts ---
pub mod contacts {
    use sea_orm::entity::prelude::*;
    use serde::{Deserialize, Serialize};
    use utoipa::ToSchema;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
    #[sea_orm(table_name = "Contact")]
    #[schema(as = Contact)]
    #[serde(rename_all = "camelCase")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: String,
        #[sea_orm(column_name = "remoteJid")]
        pub remote_jid: String,
        #[sea_orm(column_name = "pushName")]
        pub push_name: Option<String>,
        #[sea_orm(column_name = "profilePicUrl")]
        pub profile_pic_url: Option<String>,
        #[sea_orm(column_name = "instanceId")]
        pub instance_id: String,
        #[sea_orm(column_name = "updatedAt")]
        #[schema(value_type = Option<String>, format = DateTime)]
        pub updated_at: Option<DateTimeUtc>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::instances::Entity",
            from = "Column::InstanceId",
            to = "super::instances::Column::Id"
        )]
        Instance,
    }

    impl Related<super::instances::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Instance.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

// --- Media ---
pub mod media {
    use sea_orm::entity::prelude::*;
    use serde::{Deserialize, Serialize};
    use utoipa::ToSchema;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
    #[sea_orm(table_name = "Media")]
    #[schema(as = Media)]
    #[serde(rename_all = "camelCase")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: String,
        #[sea_orm(column_name = "fileName")]
        pub file_name: String,
        pub r#type: String,
        pub mimetype: String,
        #[sea_orm(column_name = "messageId")]
        pub message_id: String,
        #[sea_orm(column_name = "createdAt")]
        #[schema(value_type = Option<String>, format = DateTime)]
        pub created_at: Option<DateTimeUtc>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::messages::Entity",
            from = "Column::MessageId",
            to = "super::messages::Column::Id"
        )]
        Message,
    }

    impl Related<super::messages::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Message.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

// --- Integration sessions ---
pub mod integration_sessions {
    use sea_orm::entity::prelude::*;
    use serde::{Deserialize, Serialize};
    use utoipa::ToSchema;

    /// Stateful automation/agent conversation attached to a chat.
    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
    #[sea_orm(table_name = "IntegrationSession")]
    #[schema(as = IntegrationSession)]
    #[serde(rename_all = "camelCase")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: String,
        #[sea_orm(column_name = "remoteJid")]
        pub remote_jid: String,
        pub status: String,
        #[sea_orm(column_name = "awaitUser")]
        pub await_user: bool,
        #[sea_orm(column_name = "funnelStage")]
        pub funnel_stage: Option<String>,
        #[sea_orm(column_name = "followUpStage")]
        pub follow_up_stage: Option<String>,
        pub parameters: Option<Json>,
        pub context: Option<Json>,
        #[sea_orm(column_name = "instanceId")]
        pub instance_id: String,
        #[sea_orm(column_name = "updatedAt")]
        #[schema(value_type = Option<String>, format = DateTime)]
        pub updated_at: Option<DateTimeUtc>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::instances::Entity",
            from = "Column::InstanceId",
            to = "super::instances::Column::Id"
        )]
        Instance,
    }

    impl Related<super::instances::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Instance.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}
