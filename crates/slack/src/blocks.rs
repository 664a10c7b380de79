use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextObject {
    #[serde(rename = "plain_text")]
    Plain { text: String },
    Mrkdwn { text: String },
}

impl TextObject {
    pub fn plain(text: impl Into<String>) -> Self {
        Self::Plain { text: text.into() }
    }

    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Self::Mrkdwn { text: text.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonStyle {
    Primary,
    Danger,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ButtonElement {
    pub action_id: String,
    pub text: TextObject,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<ButtonStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl ButtonElement {
    pub fn new(action_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            action_id: action_id.into(),
            text: TextObject::plain(label),
            style: None,
            value: None,
        }
    }

    pub fn style(mut self, style: ButtonStyle) -> Self {
        self.style = Some(style);
        self
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

/// One entry of a `static_select` menu.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub text: TextObject,
    pub value: String,
}

impl SelectOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self { text: TextObject::plain(label), value: value.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StaticSelect {
    pub action_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<TextObject>,
    pub options: Vec<SelectOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_option: Option<SelectOption>,
}

impl StaticSelect {
    pub fn new(
        action_id: impl Into<String>,
        placeholder: impl Into<String>,
        options: Vec<SelectOption>,
    ) -> Self {
        Self {
            action_id: action_id.into(),
            placeholder: Some(TextObject::plain(placeholder)),
            options,
            initial_option: None,
        }
    }

    pub fn initial_option(mut self, option: SelectOption) -> Self {
        self.initial_option = Some(option);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PlainTextInput {
    pub action_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<TextObject>,
    pub multiline: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_value: Option<String>,
}

impl PlainTextInput {
    pub fn new(action_id: impl Into<String>, placeholder: impl Into<String>) -> Self {
        Self {
            action_id: action_id.into(),
            placeholder: Some(TextObject::plain(placeholder)),
            multiline: false,
            initial_value: None,
        }
    }

    pub fn multiline(mut self) -> Self {
        self.multiline = true;
        self
    }

    pub fn initial_value(mut self, value: impl Into<String>) -> Self {
        self.initial_value = Some(value.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UsersSelect {
    pub action_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<TextObject>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_user: Option<String>,
}

impl UsersSelect {
    pub fn new(action_id: impl Into<String>, placeholder: impl Into<String>) -> Self {
        Self {
            action_id: action_id.into(),
            placeholder: Some(TextObject::plain(placeholder)),
            initial_user: None,
        }
    }

    pub fn initial_user(mut self, user_id: impl Into<String>) -> Self {
        self.initial_user = Some(user_id.into());
        self
    }
}

/// Interactive element of an `input` block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputElement {
    PlainTextInput(PlainTextInput),
    StaticSelect(StaticSelect),
    UsersSelect(UsersSelect),
}

impl From<PlainTextInput> for InputElement {
    fn from(element: PlainTextInput) -> Self {
        Self::PlainTextInput(element)
    }
}

impl From<StaticSelect> for InputElement {
    fn from(element: StaticSelect) -> Self {
        Self::StaticSelect(element)
    }
}

impl From<UsersSelect> for InputElement {
    fn from(element: UsersSelect) -> Self {
        Self::UsersSelect(element)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Header {
        block_id: String,
        text: TextObject,
    },
    Section {
        block_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        text: Option<TextObject>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        fields: Vec<TextObject>,
        #[serde(skip_serializing_if = "Option::is_none")]
        accessory: Option<ButtonElement>,
    },
    Divider,
    Input {
        block_id: String,
        label: TextObject,
        element: InputElement,
        optional: bool,
    },
    Actions {
        block_id: String,
        elements: Vec<ButtonElement>,
    },
    Context {
        block_id: String,
        elements: Vec<TextObject>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MessageTemplate {
    pub fallback_text: String,
    pub blocks: Vec<Block>,
}

pub struct MessageBuilder {
    fallback_text: String,
    blocks: Vec<Block>,
}

impl MessageBuilder {
    pub fn new(fallback_text: impl Into<String>) -> Self {
        Self { fallback_text: fallback_text.into(), blocks: Vec::new() }
    }

    pub fn header(mut self, block_id: impl Into<String>, text: impl Into<String>) -> Self {
        self.blocks
            .push(Block::Header { block_id: block_id.into(), text: TextObject::plain(text) });
        self
    }

    pub fn section<F>(mut self, block_id: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut SectionBuilder),
    {
        let mut builder = SectionBuilder::default();
        build(&mut builder);
        self.blocks.push(builder.build(block_id.into()));
        self
    }

    pub fn divider(mut self) -> Self {
        self.blocks.push(Block::Divider);
        self
    }

    pub fn actions<F>(mut self, block_id: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut ActionsBuilder),
    {
        let mut builder = ActionsBuilder::default();
        build(&mut builder);
        self.blocks.push(Block::Actions { block_id: block_id.into(), elements: builder.build() });
        self
    }

    pub fn context<F>(mut self, block_id: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut ContextBuilder),
    {
        let mut builder = ContextBuilder::default();
        build(&mut builder);
        self.blocks.push(Block::Context { block_id: block_id.into(), elements: builder.build() });
        self
    }

    pub fn build(self) -> MessageTemplate {
        MessageTemplate { fallback_text: self.fallback_text, blocks: self.blocks }
    }
}

#[derive(Default)]
pub struct SectionBuilder {
    text: Option<TextObject>,
    fields: Vec<TextObject>,
    accessory: Option<ButtonElement>,
}

impl SectionBuilder {
    pub fn plain(&mut self, text: impl Into<String>) -> &mut Self {
        self.text = Some(TextObject::plain(text));
        self
    }

    pub fn mrkdwn(&mut self, text: impl Into<String>) -> &mut Self {
        self.text = Some(TextObject::mrkdwn(text));
        self
    }

    /// Adds a two-column field. Sections with fields may omit the body text.
    pub fn mrkdwn_field(&mut self, text: impl Into<String>) -> &mut Self {
        self.fields.push(TextObject::mrkdwn(text));
        self
    }

    pub fn accessory(&mut self, button: ButtonElement) -> &mut Self {
        self.accessory = Some(button);
        self
    }

    pub(crate) fn build(self, block_id: String) -> Block {
        let text = if self.text.is_none() && self.fields.is_empty() {
            Some(TextObject::plain(""))
        } else {
            self.text
        };
        Block::Section { block_id, text, fields: self.fields, accessory: self.accessory }
    }
}

#[derive(Default)]
pub struct ActionsBuilder {
    elements: Vec<ButtonElement>,
}

impl ActionsBuilder {
    pub fn button(&mut self, button: ButtonElement) -> &mut Self {
        self.elements.push(button);
        self
    }

    pub(crate) fn build(self) -> Vec<ButtonElement> {
        self.elements
    }
}

#[derive(Default)]
pub struct ContextBuilder {
    elements: Vec<TextObject>,
}

impl ContextBuilder {
    pub fn plain(&mut self, text: impl Into<String>) -> &mut Self {
        self.elements.push(TextObject::plain(text));
        self
    }

    pub fn mrkdwn(&mut self, text: impl Into<String>) -> &mut Self {
        self.elements.push(TextObject::mrkdwn(text));
        self
    }

    pub(crate) fn build(self) -> Vec<TextObject> {
        self.elements
    }
}

/// Greeting posted when the bot is mentioned.
pub fn mention_greeting(user_id: &str) -> MessageTemplate {
    MessageBuilder::new(format!(":wave: <@{user_id}> what's up?"))
        .section("hello.greeting.v1", |section| {
            section.mrkdwn(format!(":wave: <@{user_id}> what's up?")).accessory(
                ButtonElement::new("hello.ping.v1", "Click Me").value("click_me_123"),
            );
        })
        .context("hello.context.v1", |context| {
            context.plain("This message is posted by Peerly");
        })
        .build()
}

/// View model for one roster line. Mapping from the users.list payload is the
/// caller's job; display fallbacks happen here.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RosterEntry {
    pub user_id: String,
    pub display_name: String,
    pub title: Option<String>,
    pub email: Option<String>,
}

pub fn roster_message(entries: &[RosterEntry]) -> MessageTemplate {
    let listing = if entries.is_empty() {
        "No active users found.".to_owned()
    } else {
        entries
            .iter()
            .map(|entry| {
                format!(
                    "• *{}* (<@{}>)\n  _{}_ | {}",
                    entry.display_name,
                    entry.user_id,
                    entry.title.as_deref().unwrap_or("No title"),
                    entry.email.as_deref().unwrap_or("No email"),
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    };

    MessageBuilder::new(format!("Found {} active users", entries.len()))
        .section("roster.header.v1", |section| {
            section.mrkdwn(format!("*Active Users in Workspace* ({} total)", entries.len()));
        })
        .divider()
        .section("roster.list.v1", |section| {
            section.mrkdwn(listing);
        })
        .build()
}
