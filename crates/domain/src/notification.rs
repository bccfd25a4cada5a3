use crate::shared::entity::ID;
use serde::{de::Visitor, Deserialize, Serialize};
use std::collections::HashMap;

/// Wording tone for the notification title. Unrecognized styles fall
/// back to `Default` both on deserialization and on lookup by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MessageStyle {
    #[default]
    Default,
    Mom,
    Dad,
    Cat,
}

impl MessageStyle {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Mom => "mom",
            Self::Dad => "dad",
            Self::Cat => "cat",
        }
    }

    /// The notification title for this style.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Default => "お薬を飲む時間です！",
            Self::Mom => "ハニー、お薬を忘れずに飲んでね！",
            Self::Dad => "チャンプ、お薬を飲む時間だ！",
            Self::Cat => "にゃー！お薬の時間だよ！",
        }
    }

    /// Human-readable label shown in the settings UI.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Default => "デフォルト",
            Self::Mom => "おかん風",
            Self::Dad => "オヤジ風",
            Self::Cat => "猫風",
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name {
            "mom" => Self::Mom,
            "dad" => Self::Dad,
            "cat" => Self::Cat,
            _ => Self::Default,
        }
    }
}

impl Serialize for MessageStyle {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for MessageStyle {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct MessageStyleVisitor;

        impl<'de> Visitor<'de> for MessageStyleVisitor {
            type Value = MessageStyle;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(formatter, "a message style name")
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                // Unknown styles degrade to the default wording.
                Ok(MessageStyle::from_name(value))
            }
        }

        deserializer.deserialize_str(MessageStyleVisitor)
    }
}

/// Per-medication notification preferences. A medication with no
/// setting at all is treated the same as `enabled: false`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationSetting {
    #[serde(rename = "on")]
    pub enabled: bool,
    #[serde(rename = "messageType", default)]
    pub message_style: MessageStyle,
}

pub type NotificationSettings = HashMap<ID, NotificationSetting>;
