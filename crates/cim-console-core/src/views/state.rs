use crate::api::ApiError;
use crate::models::{Group, Policy, Record, ResourceKind, User};
use crate::router::Route;

// ============================================================================
// Editable fields
// ============================================================================

/// A text field the detail forms can edit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Email,
    Description,
}

impl Field {
    pub fn label(&self) -> &'static str {
        match self {
            Field::Name => "Name",
            Field::Email => "Email",
            Field::Description => "Description",
        }
    }
}

pub trait Editable {
    const FIELDS: &'static [Field];

    fn field(&self, field: Field) -> String;
    fn set_field(&mut self, field: Field, value: String);
}

impl Editable for User {
    const FIELDS: &'static [Field] = &[Field::Name, Field::Email];

    fn field(&self, field: Field) -> String {
        match field {
            Field::Name => self.name.clone().unwrap_or_default(),
            Field::Email => self.email.clone().unwrap_or_default(),
            Field::Description => self.desc.clone(),
        }
    }

    fn set_field(&mut self, field: Field, value: String) {
        match field {
            Field::Name => self.name = Some(value),
            Field::Email => self.email = Some(value),
            Field::Description => self.desc = value,
        }
    }
}

impl Editable for Group {
    const FIELDS: &'static [Field] = &[Field::Name];

    fn field(&self, field: Field) -> String {
        match field {
            Field::Name => self.name.clone(),
            Field::Description => self.desc.clone(),
            Field::Email => String::new(),
        }
    }

    fn set_field(&mut self, field: Field, value: String) {
        match field {
            Field::Name => self.name = value,
            Field::Description => self.desc = value,
            Field::Email => {}
        }
    }
}

impl Editable for Policy {
    const FIELDS: &'static [Field] = &[Field::Description];

    fn field(&self, field: Field) -> String {
        match field {
            Field::Description => self.desc.clone(),
            Field::Name | Field::Email => String::new(),
        }
    }

    fn set_field(&mut self, field: Field, value: String) {
        if field == Field::Description {
            self.desc = value;
        }
    }
}

// ============================================================================
// List and detail state
// ============================================================================

/// Rows of one collection. `None` means the load has not completed.
#[derive(Debug, Clone)]
pub struct ListView<T> {
    items: Option<Vec<T>>,
}

impl<T> Default for ListView<T> {
    fn default() -> Self {
        Self { items: None }
    }
}

impl<T: Record> ListView<T> {
    pub fn loading() -> Self {
        Self::default()
    }

    pub fn is_loading(&self) -> bool {
        self.items.is_none()
    }

    pub fn items(&self) -> Option<&[T]> {
        self.items.as_deref()
    }

    pub fn len(&self) -> usize {
        self.items.as_ref().map(Vec::len).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.as_ref().and_then(|items| items.get(index))
    }

    pub fn set_items(&mut self, items: Vec<T>) {
        self.items = Some(items);
    }

    /// Drop the row with this id from local state. Returns whether one was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        match self.items {
            Some(ref mut items) => {
                let before = items.len();
                items.retain(|item| item.id() != id);
                items.len() != before
            }
            None => false,
        }
    }
}

/// One record being viewed or edited.
#[derive(Debug, Clone)]
pub struct DetailView<T> {
    id: String,
    record: Option<T>,
    notice: Option<String>,
}

impl<T: Editable> DetailView<T> {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            record: None,
            notice: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn record(&self) -> Option<&T> {
        self.record.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.record.is_none()
    }

    pub fn set_record(&mut self, record: T) {
        self.record = Some(record);
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn set_notice(&mut self, notice: impl Into<String>) {
        self.notice = Some(notice.into());
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }

    pub fn field(&self, field: Field) -> Option<String> {
        self.record.as_ref().map(|r| r.field(field))
    }

    pub fn set_field(&mut self, field: Field, value: String) -> bool {
        match self.record {
            Some(ref mut record) => {
                record.set_field(field, value);
                self.notice = None;
                true
            }
            None => false,
        }
    }
}

// ============================================================================
// Events from view tasks
// ============================================================================

#[derive(Debug, Clone)]
pub enum LoadedData {
    Users(Vec<User>),
    Groups(Vec<Group>),
    Policies(Vec<Policy>),
    User(User),
    Group(Group),
    Policy(Policy),
}

/// Result of a request started by a view.
#[derive(Debug)]
pub enum ViewEvent {
    Loaded(LoadedData),
    Deleted { kind: ResourceKind, id: String },
    Updated { kind: ResourceKind, id: String },
    Failed { action: &'static str, error: ApiError },
}

// ============================================================================
// View
// ============================================================================

#[derive(Debug, Clone)]
pub enum View {
    Login { return_to: Option<Route> },
    Dashboard,
    Users(ListView<User>),
    Groups(ListView<Group>),
    Policies(ListView<Policy>),
    User(DetailView<User>),
    Group(DetailView<Group>),
    Policy(DetailView<Policy>),
}

impl View {
    pub fn for_route(route: &Route, return_to: Option<Route>) -> Self {
        match route {
            Route::Login => View::Login { return_to },
            Route::Dashboard => View::Dashboard,
            Route::List(ResourceKind::Users) => View::Users(ListView::loading()),
            Route::List(ResourceKind::Groups) => View::Groups(ListView::loading()),
            Route::List(ResourceKind::Policies) => View::Policies(ListView::loading()),
            Route::Detail(ResourceKind::Users, id) => View::User(DetailView::new(id.as_str())),
            Route::Detail(ResourceKind::Groups, id) => View::Group(DetailView::new(id.as_str())),
            Route::Detail(ResourceKind::Policies, id) => View::Policy(DetailView::new(id.as_str())),
        }
    }

    pub fn return_to(&self) -> Option<&Route> {
        match self {
            View::Login { return_to } => return_to.as_ref(),
            _ => None,
        }
    }

    /// Install loaded data. Returns false when the data does not belong here.
    pub fn apply_loaded(&mut self, data: LoadedData) -> bool {
        match (self, data) {
            (View::Users(list), LoadedData::Users(items)) => list.set_items(items),
            (View::Groups(list), LoadedData::Groups(items)) => list.set_items(items),
            (View::Policies(list), LoadedData::Policies(items)) => list.set_items(items),
            (View::User(detail), LoadedData::User(record)) => detail.set_record(record),
            (View::Group(detail), LoadedData::Group(record)) => detail.set_record(record),
            (View::Policy(detail), LoadedData::Policy(record)) => detail.set_record(record),
            _ => return false,
        }
        true
    }

    /// Collection shown by a list view
    pub fn list_kind(&self) -> Option<ResourceKind> {
        match self {
            View::Users(_) => Some(ResourceKind::Users),
            View::Groups(_) => Some(ResourceKind::Groups),
            View::Policies(_) => Some(ResourceKind::Policies),
            _ => None,
        }
    }

    /// Entity type and id shown by a detail view
    pub fn detail_target(&self) -> Option<(ResourceKind, &str)> {
        match self {
            View::User(d) => Some((ResourceKind::Users, d.id())),
            View::Group(d) => Some((ResourceKind::Groups, d.id())),
            View::Policy(d) => Some((ResourceKind::Policies, d.id())),
            _ => None,
        }
    }

    pub fn remove_item(&mut self, kind: ResourceKind, id: &str) -> bool {
        match (self, kind) {
            (View::Users(list), ResourceKind::Users) => list.remove(id),
            (View::Groups(list), ResourceKind::Groups) => list.remove(id),
            (View::Policies(list), ResourceKind::Policies) => list.remove(id),
            _ => false,
        }
    }

    /// Record a successful save on the matching detail view
    pub fn mark_updated(&mut self, kind: ResourceKind, id: &str) -> bool {
        let notice = format!("{} updated successfully", kind.singular());
        match (self, kind) {
            (View::User(d), ResourceKind::Users) if d.id() == id => d.set_notice(notice),
            (View::Group(d), ResourceKind::Groups) if d.id() == id => d.set_notice(notice),
            (View::Policy(d), ResourceKind::Policies) if d.id() == id => d.set_notice(notice),
            _ => return false,
        }
        true
    }

    pub fn is_loading(&self) -> bool {
        match self {
            View::Login { .. } | View::Dashboard => false,
            View::Users(l) => l.is_loading(),
            View::Groups(l) => l.is_loading(),
            View::Policies(l) => l.is_loading(),
            View::User(d) => d.is_loading(),
            View::Group(d) => d.is_loading(),
            View::Policy(d) => d.is_loading(),
        }
    }

    /// Number of rows in a loaded list view
    pub fn row_count(&self) -> usize {
        match self {
            View::Users(l) => l.len(),
            View::Groups(l) => l.len(),
            View::Policies(l) => l.len(),
            _ => 0,
        }
    }

    pub fn row_id(&self, index: usize) -> Option<&str> {
        match self {
            View::Users(l) => l.get(index).map(Record::id),
            View::Groups(l) => l.get(index).map(Record::id),
            View::Policies(l) => l.get(index).map(Record::id),
            _ => None,
        }
    }

    pub fn fields(&self) -> &'static [Field] {
        match self {
            View::User(_) => User::FIELDS,
            View::Group(_) => Group::FIELDS,
            View::Policy(_) => Policy::FIELDS,
            _ => &[],
        }
    }

    pub fn field_value(&self, field: Field) -> Option<String> {
        match self {
            View::User(d) => d.field(field),
            View::Group(d) => d.field(field),
            View::Policy(d) => d.field(field),
            _ => None,
        }
    }

    pub fn set_field(&mut self, field: Field, value: String) -> bool {
        match self {
            View::User(d) => d.set_field(field, value),
            View::Group(d) => d.set_field(field, value),
            View::Policy(d) => d.set_field(field, value),
            _ => false,
        }
    }

    pub fn clear_notice(&mut self) {
        match self {
            View::User(d) => d.clear_notice(),
            View::Group(d) => d.clear_notice(),
            View::Policy(d) => d.clear_notice(),
            _ => {}
        }
    }

    pub fn notice(&self) -> Option<&str> {
        match self {
            View::User(d) => d.notice(),
            View::Group(d) => d.notice(),
            View::Policy(d) => d.notice(),
            _ => None,
        }
    }
}
