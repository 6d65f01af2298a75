//! Parsed SAML 2.0 assertion model.
//!
//! These types describe an assertion after the wire XML has been parsed and
//! its signature accepted by the caller. They are immutable inputs to the
//! validation pipeline: every stage borrows the same value.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A parsed `<saml:Assertion>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assertion {
    /// The assertion `ID` attribute, used for replay detection.
    pub id: String,
    /// When the `IdP` issued the assertion.
    pub issue_instant: DateTime<Utc>,
    /// Raw `<saml:Issuer>` value.
    pub issuer: String,
    /// Subject `NameID`, if the assertion names one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<NameId>,
    /// `<saml:Conditions>`.
    #[serde(default)]
    pub conditions: Conditions,
    /// `<saml:AuthnStatement>` elements in document order.
    #[serde(default)]
    pub authn_statements: Vec<AuthnStatement>,
    /// `<saml:AttributeStatement>` elements in document order.
    #[serde(default)]
    pub attribute_statements: Vec<AttributeStatement>,
}

impl Assertion {
    /// Create a new builder for constructing an assertion.
    #[must_use]
    pub fn builder(id: impl Into<String>, issuer: impl Into<String>) -> AssertionBuilder {
        AssertionBuilder::new(id, issuer)
    }

    /// All audience URIs declared across every `<AudienceRestriction>`.
    pub fn declared_audiences(&self) -> impl Iterator<Item = &str> {
        self.conditions
            .audience_restrictions
            .iter()
            .flat_map(|r| r.audiences.iter().map(String::as_str))
    }
}

/// Subject `<saml:NameID>` with its qualifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameId {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_qualifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sp_name_qualifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sp_provided_id: Option<String>,
}

impl NameId {
    /// A `NameID` with only a value and no qualifiers.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    #[must_use]
    pub fn with_name_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.name_qualifier = Some(qualifier.into());
        self
    }

    #[must_use]
    pub fn with_sp_name_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.sp_name_qualifier = Some(qualifier.into());
        self
    }

    #[must_use]
    pub fn with_sp_provided_id(mut self, id: impl Into<String>) -> Self {
        self.sp_provided_id = Some(id.into());
        self
    }
}

/// `<saml:Conditions>`: validity window and audience scoping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Conditions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_before: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_on_or_after: Option<DateTime<Utc>>,
    #[serde(default)]
    pub audience_restrictions: Vec<AudienceRestriction>,
}

/// A single `<saml:AudienceRestriction>`. The assertion is addressed to the
/// relying party if any one of its audiences matches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudienceRestriction {
    pub audiences: Vec<String>,
}

impl AudienceRestriction {
    pub fn new<I, S>(audiences: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            audiences: audiences.into_iter().map(Into::into).collect(),
        }
    }
}

/// `<saml:AuthnStatement>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthnStatement {
    pub authn_instant: DateTime<Utc>,
    #[serde(default)]
    pub authn_context: AuthnContext,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_index: Option<String>,
}

impl AuthnStatement {
    #[must_use]
    pub fn new(authn_instant: DateTime<Utc>) -> Self {
        Self {
            authn_instant,
            authn_context: AuthnContext::default(),
            session_index: None,
        }
    }

    #[must_use]
    pub fn with_class_ref(mut self, class_ref: impl Into<String>) -> Self {
        self.authn_context.class_ref = Some(class_ref.into());
        self
    }

    #[must_use]
    pub fn with_decl_ref(mut self, decl_ref: impl Into<String>) -> Self {
        self.authn_context.decl_ref = Some(decl_ref.into());
        self
    }

    #[must_use]
    pub fn with_session_index(mut self, session_index: impl Into<String>) -> Self {
        self.session_index = Some(session_index.into());
        self
    }

    /// The session index, treating an empty string as absent.
    pub fn non_empty_session_index(&self) -> Option<&str> {
        self.session_index.as_deref().filter(|s| !s.is_empty())
    }
}

/// `<saml:AuthnContext>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthnContext {
    /// `<AuthnContextClassRef>`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_ref: Option<String>,
    /// `<AuthnContextDeclRef>`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decl_ref: Option<String>,
}

/// `<saml:AttributeStatement>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeStatement {
    pub attributes: Vec<Attribute>,
}

/// `<saml:Attribute>` with its values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub friendly_name: Option<String>,
    #[serde(default)]
    pub values: Vec<String>,
}

impl Attribute {
    pub fn new<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            name_format: None,
            friendly_name: None,
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

/// Builder for constructing assertions, mainly for callers that map their own
/// parser output into this model.
#[derive(Debug)]
pub struct AssertionBuilder {
    id: String,
    issuer: String,
    issue_instant: Option<DateTime<Utc>>,
    subject: Option<NameId>,
    conditions: Conditions,
    authn_statements: Vec<AuthnStatement>,
    attributes: Vec<Attribute>,
}

impl AssertionBuilder {
    fn new(id: impl Into<String>, issuer: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            issuer: issuer.into(),
            issue_instant: None,
            subject: None,
            conditions: Conditions::default(),
            authn_statements: Vec::new(),
            attributes: Vec::new(),
        }
    }

    #[must_use]
    pub fn issue_instant(mut self, instant: DateTime<Utc>) -> Self {
        self.issue_instant = Some(instant);
        self
    }

    #[must_use]
    pub fn subject(mut self, name_id: NameId) -> Self {
        self.subject = Some(name_id);
        self
    }

    #[must_use]
    pub fn not_before(mut self, instant: DateTime<Utc>) -> Self {
        self.conditions.not_before = Some(instant);
        self
    }

    #[must_use]
    pub fn not_on_or_after(mut self, instant: DateTime<Utc>) -> Self {
        self.conditions.not_on_or_after = Some(instant);
        self
    }

    /// Add one `<AudienceRestriction>` containing the given audiences.
    #[must_use]
    pub fn audience_restriction<I, S>(mut self, audiences: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.conditions
            .audience_restrictions
            .push(AudienceRestriction::new(audiences));
        self
    }

    #[must_use]
    pub fn authn_statement(mut self, statement: AuthnStatement) -> Self {
        self.authn_statements.push(statement);
        self
    }

    /// Add an attribute. All attributes end up in a single attribute statement.
    #[must_use]
    pub fn attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Build the assertion.
    ///
    /// `issue_instant` defaults to the Unix epoch when unset; the pipeline
    /// never reads it for validation.
    #[must_use]
    pub fn build(self) -> Assertion {
        let attribute_statements = if self.attributes.is_empty() {
            Vec::new()
        } else {
            vec![AttributeStatement {
                attributes: self.attributes,
            }]
        };

        Assertion {
            id: self.id,
            issue_instant: self.issue_instant.unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
            issuer: self.issuer,
            subject: self.subject,
            conditions: self.conditions,
            authn_statements: self.authn_statements,
            attribute_statements,
        }
    }
}
