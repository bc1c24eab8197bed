//! Strict decoding between raw store documents / asset JSON and domain types.
//!
//! Everything untyped stops here: callers receive domain values or a `DecodeError`.

use lesson_core::model::{
    Content, Descriptor, Lesson, LessonId, Module, ModuleId, ProgressSnapshot, Question,
    QuestionId, Test, UserProfile,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::repository::{CollectionPath, Document, DocumentPath, Fields};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DecodeError {
    #[error("{origin}: unexpected shape: {source}")]
    Shape {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{origin}: invalid value: {source}")]
    Invalid {
        origin: String,
        #[source]
        source: lesson_core::Error,
    },
}

impl DecodeError {
    fn shape(origin: impl ToString, source: serde_json::Error) -> Self {
        Self::Shape {
            origin: origin.to_string(),
            source,
        }
    }

    fn invalid(origin: impl ToString, source: impl Into<lesson_core::Error>) -> Self {
        Self::Invalid {
            origin: origin.to_string(),
            source: source.into(),
        }
    }
}

//
// ─── RECORDS ───────────────────────────────────────────────────────────────────
//

/// Either a JSON string or a JSON integer, normalized to a string.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
enum FlexString {
    Text(String),
    Number(i64),
}

impl FlexString {
    fn into_string(self) -> String {
        match self {
            FlexString::Text(s) => s,
            FlexString::Number(n) => n.to_string(),
        }
    }
}

impl Default for FlexString {
    fn default() -> Self {
        FlexString::Text(String::new())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub(crate) struct LessonRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<LessonId>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    video: String,
    #[serde(default)]
    duration: String,
    #[serde(default)]
    explanation: String,
}

impl LessonRecord {
    fn from_lesson(lesson: &Lesson) -> Self {
        Self {
            id: Some(lesson.id().clone()),
            title: lesson.title().to_owned(),
            video: lesson.video().to_owned(),
            duration: lesson.duration().to_owned(),
            explanation: lesson.explanation().to_owned(),
        }
    }

    fn into_lesson(self, fallback_id: &str, origin: &str) -> Result<Lesson, DecodeError> {
        let id = match self.id {
            Some(id) => id,
            None => LessonId::new(fallback_id).map_err(|e| DecodeError::invalid(origin, e))?,
        };
        Ok(Lesson::new(
            id,
            self.title,
            self.video,
            self.duration,
            self.explanation,
        ))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QuestionRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<QuestionId>,
    #[serde(default)]
    content: String,
    correct_index: usize,
    answers: Vec<String>,
}

impl QuestionRecord {
    fn from_question(question: &Question) -> Self {
        Self {
            id: Some(question.id().clone()),
            content: question.content().to_owned(),
            correct_index: question.correct_index(),
            answers: question.answers().to_vec(),
        }
    }

    fn into_question(self, fallback_id: &str, origin: &str) -> Result<Question, DecodeError> {
        let id = match self.id {
            Some(id) => id,
            None => QuestionId::new(fallback_id).map_err(|e| DecodeError::invalid(origin, e))?,
        };
        Question::new(id, self.content, self.answers, self.correct_index)
            .map_err(|e| DecodeError::invalid(origin, e))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub(crate) struct ContentRecord {
    #[serde(default)]
    id: FlexString,
    #[serde(default)]
    description: String,
    #[serde(default)]
    image: String,
    #[serde(default)]
    time: String,
    /// Only read by the seeding tool; the catalog fills lessons lazily.
    #[serde(default, skip_serializing)]
    lessons: Vec<LessonRecord>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub(crate) struct TestRecord {
    #[serde(default)]
    id: FlexString,
    #[serde(default)]
    description: String,
    #[serde(default)]
    image: String,
    #[serde(default)]
    time: String,
    /// Only read by the seeding tool; the catalog fills questions lazily.
    #[serde(default, skip_serializing)]
    questions: Vec<QuestionRecord>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub(crate) struct ModuleRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<ModuleId>,
    category: String,
    content: ContentRecord,
    test: TestRecord,
}

impl ModuleRecord {
    fn from_module(module: &Module) -> Self {
        let content = module.content().descriptor();
        let test = module.test().descriptor();
        Self {
            id: Some(module.id().clone()),
            category: module.category().to_owned(),
            content: ContentRecord {
                id: FlexString::Text(content.id.clone()),
                description: content.description.clone(),
                image: content.image.clone(),
                time: content.time.clone(),
                lessons: Vec::new(),
            },
            test: TestRecord {
                id: FlexString::Text(test.id.clone()),
                description: test.description.clone(),
                image: test.image.clone(),
                time: test.time.clone(),
                questions: Vec::new(),
            },
        }
    }

    fn into_module(self, fallback_id: Option<&str>, origin: &str) -> Result<Module, DecodeError> {
        let id = match self.id {
            Some(id) => id,
            None => ModuleId::new(fallback_id.unwrap_or_default())
                .map_err(|e| DecodeError::invalid(origin, e))?,
        };
        let content = Content::new(Descriptor {
            id: self.content.id.into_string(),
            description: self.content.description,
            image: self.content.image,
            time: self.content.time,
        });
        let test = Test::new(Descriptor {
            id: self.test.id.into_string(),
            description: self.test.description,
            image: self.test.image,
            time: self.test.time,
        });
        Ok(Module::new(id, self.category, content, test))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserRecord {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    last_module: Option<FlexString>,
    #[serde(default)]
    last_lesson: Option<usize>,
    #[serde(default)]
    last_question: Option<usize>,
}

//
// ─── DECODING ──────────────────────────────────────────────────────────────────
//

fn from_fields<T: for<'de> Deserialize<'de>>(doc: &Document) -> Result<T, DecodeError> {
    serde_json::from_value(Value::Object(doc.fields.clone()))
        .map_err(|e| DecodeError::shape(&doc.path, e))
}

/// Decode a module metadata document. Nested lessons/questions are left empty.
///
/// # Errors
///
/// Returns `DecodeError` if the document does not match the module schema.
pub fn decode_module(doc: &Document) -> Result<Module, DecodeError> {
    let record: ModuleRecord = from_fields(doc)?;
    record.into_module(Some(doc.path.id()), &doc.path.to_string())
}

/// # Errors
///
/// Returns `DecodeError` if the document does not match the lesson schema.
pub fn decode_lesson(doc: &Document) -> Result<Lesson, DecodeError> {
    let record: LessonRecord = from_fields(doc)?;
    record.into_lesson(doc.path.id(), &doc.path.to_string())
}

/// # Errors
///
/// Returns `DecodeError` if the document does not match the question schema or
/// its `correctIndex` does not name one of its answers.
pub fn decode_question(doc: &Document) -> Result<Question, DecodeError> {
    let record: QuestionRecord = from_fields(doc)?;
    record.into_question(doc.path.id(), &doc.path.to_string())
}

/// Decode a user document. Absent fields default; `lastModule` is read as a module id.
///
/// # Errors
///
/// Returns `DecodeError` if a present field has the wrong type.
pub fn decode_user(doc: &Document) -> Result<UserProfile, DecodeError> {
    let record: UserRecord = from_fields(doc)?;
    let last_module = record
        .last_module
        .map(FlexString::into_string)
        .and_then(|raw| ModuleId::new(raw).ok());
    Ok(UserProfile {
        name: record.name.unwrap_or_default(),
        last_module,
        last_lesson: record.last_lesson,
        last_question: record.last_question,
    })
}

/// Decode every document of a collection, failing on the first bad one.
///
/// # Errors
///
/// Returns the first `DecodeError` encountered.
pub fn decode_all<T>(
    docs: &[Document],
    decode: impl Fn(&Document) -> Result<T, DecodeError>,
) -> Result<Vec<T>, DecodeError> {
    docs.iter().map(decode).collect()
}

/// Decode the bundled catalog asset: a JSON array of modules.
///
/// Ids missing from a bundled module are an error; there is no document id to fall back on.
///
/// # Errors
///
/// Returns `DecodeError` if the bytes are not a module array.
pub fn decode_catalog_asset(name: &str, bytes: &[u8]) -> Result<Vec<Module>, DecodeError> {
    let records: Vec<ModuleRecord> =
        serde_json::from_slice(bytes).map_err(|e| DecodeError::shape(name, e))?;
    records
        .into_iter()
        .enumerate()
        .map(|(i, record)| record.into_module(None, &format!("{name}[{i}]")))
        .collect()
}

/// A bundle entry with its nested lessons and questions, used for seeding a remote store.
#[derive(Debug, Clone)]
pub struct SeedModule {
    pub module: Module,
    pub lessons: Vec<Lesson>,
    pub questions: Vec<Question>,
}

/// Decode a full content bundle including nested lessons and questions.
///
/// # Errors
///
/// Returns `DecodeError` if any entry does not match the schema.
pub fn decode_seed_bundle(name: &str, bytes: &[u8]) -> Result<Vec<SeedModule>, DecodeError> {
    let records: Vec<ModuleRecord> =
        serde_json::from_slice(bytes).map_err(|e| DecodeError::shape(name, e))?;
    let mut out = Vec::with_capacity(records.len());
    for (i, mut record) in records.into_iter().enumerate() {
        let origin = format!("{name}[{i}]");
        let lessons = std::mem::take(&mut record.content.lessons)
            .into_iter()
            .enumerate()
            .map(|(n, l)| l.into_lesson(&n.to_string(), &origin))
            .collect::<Result<Vec<_>, _>>()?;
        let questions = std::mem::take(&mut record.test.questions)
            .into_iter()
            .enumerate()
            .map(|(n, q)| q.into_question(&n.to_string(), &origin))
            .collect::<Result<Vec<_>, _>>()?;
        let module = record.into_module(None, &origin)?;
        out.push(SeedModule {
            module,
            lessons,
            questions,
        });
    }
    Ok(out)
}

/// Store documents mirroring a seed bundle: module metadata plus the nested
/// lesson and question collections, in bundle order.
#[must_use]
pub fn seed_documents(seeded: &[SeedModule]) -> Vec<(DocumentPath, Fields)> {
    let modules = CollectionPath::modules();
    let mut docs = Vec::new();
    for entry in seeded {
        let id = entry.module.id();
        docs.push((modules.doc(id.as_str()), encode_module(&entry.module)));

        let lessons = CollectionPath::lessons(id);
        docs.extend(
            entry
                .lessons
                .iter()
                .map(|lesson| (lessons.doc(lesson.id().as_str()), encode_lesson(lesson))),
        );
        let questions = CollectionPath::questions(id);
        docs.extend(entry.questions.iter().map(|question| {
            (
                questions.doc(question.id().as_str()),
                encode_question(question),
            )
        }));
    }
    docs
}

//
// ─── ENCODING ──────────────────────────────────────────────────────────────────
//

fn to_fields<T: Serialize>(value: &T) -> Fields {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => map,
        _ => Fields::new(),
    }
}

#[must_use]
pub fn encode_module(module: &Module) -> Fields {
    to_fields(&ModuleRecord::from_module(module))
}

#[must_use]
pub fn encode_lesson(lesson: &Lesson) -> Fields {
    to_fields(&LessonRecord::from_lesson(lesson))
}

#[must_use]
pub fn encode_question(question: &Question) -> Fields {
    to_fields(&QuestionRecord::from_question(question))
}

/// Merge payload for the resume fields of a user document.
///
/// Without a module the stored `lastModule` is left as it is.
#[must_use]
pub fn encode_progress(snapshot: &ProgressSnapshot) -> Fields {
    let mut fields = Fields::new();
    if let Some(id) = &snapshot.module {
        fields.insert("lastModule".into(), Value::String(id.as_str().to_owned()));
    }
    fields.insert("lastLesson".into(), Value::from(snapshot.lesson));
    fields.insert("lastQuestion".into(), Value::from(snapshot.question));
    fields
}

/// Merge payload for a user's display name.
#[must_use]
pub fn encode_name(name: &str) -> Fields {
    let mut fields = Fields::new();
    fields.insert("name".into(), Value::String(name.to_owned()));
    fields
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use lesson_core::model::IdentityId;
    use serde_json::json;

    fn doc(collection: CollectionPath, id: &str, value: Value) -> Document {
        Document {
            path: collection.doc(id),
            fields: value.as_object().cloned().unwrap(),
        }
    }

    fn m1() -> ModuleId {
        ModuleId::new("m1").unwrap()
    }

    #[test]
    fn module_document_falls_back_to_document_id() {
        let d = doc(
            CollectionPath::modules(),
            "swift",
            json!({
                "category": "Swift",
                "content": {"id": 1, "description": "Learn", "image": "swift.jpg", "time": "3 hours"},
                "test": {"id": 2, "description": "Quiz", "image": "t.jpg", "time": "5 min"}
            }),
        );
        let module = decode_module(&d).unwrap();
        assert_eq!(module.id().as_str(), "swift");
        assert_eq!(module.category(), "Swift");
        assert_eq!(module.content().descriptor().id, "1");
        assert!(module.lessons().is_empty());
        assert!(module.questions().is_empty());
    }

    #[test]
    fn module_without_category_is_a_shape_error() {
        let d = doc(
            CollectionPath::modules(),
            "m1",
            json!({"content": {}, "test": {}}),
        );
        assert!(matches!(decode_module(&d), Err(DecodeError::Shape { .. })));
    }

    #[test]
    fn question_with_bad_correct_index_is_invalid() {
        let d = doc(
            CollectionPath::questions(&m1()),
            "q1",
            json!({"content": "<p>?</p>", "correctIndex": 5, "answers": ["a", "b"]}),
        );
        assert!(matches!(
            decode_question(&d),
            Err(DecodeError::Invalid { .. })
        ));
    }

    #[test]
    fn question_with_negative_correct_index_is_a_shape_error() {
        let d = doc(
            CollectionPath::questions(&m1()),
            "q1",
            json!({"correctIndex": -1, "answers": ["a"]}),
        );
        assert!(matches!(decode_question(&d), Err(DecodeError::Shape { .. })));
    }

    #[test]
    fn question_decodes_answers_in_order() {
        let d = doc(
            CollectionPath::questions(&m1()),
            "q1",
            json!({"id": 7, "content": "<p>?</p>", "correctIndex": 1, "answers": ["A", "B", "C"]}),
        );
        let q = decode_question(&d).unwrap();
        assert_eq!(q.id().as_str(), "7");
        assert_eq!(q.answers(), ["A", "B", "C"]);
        assert_eq!(q.correct_index(), 1);
    }

    #[test]
    fn user_document_defaults_absent_fields() {
        let d = doc(CollectionPath::users(), "u1", json!({}));
        let profile = decode_user(&d).unwrap();
        assert_eq!(profile, UserProfile::default());
    }

    #[test]
    fn legacy_integer_last_module_is_read_as_an_id() {
        let d = doc(
            CollectionPath::users(),
            "u1",
            json!({"name": "Ada", "lastModule": 0, "lastLesson": 2}),
        );
        let profile = decode_user(&d).unwrap();
        assert_eq!(profile.last_module, Some(ModuleId::new("0").unwrap()));
        assert_eq!(profile.last_lesson, Some(2));
        assert_eq!(profile.last_question, None);
    }

    #[test]
    fn catalog_asset_requires_module_ids() {
        let bytes = br#"[{"category": "Swift", "content": {}, "test": {}}]"#;
        assert!(matches!(
            decode_catalog_asset("data.json", bytes),
            Err(DecodeError::Invalid { .. })
        ));
    }

    #[test]
    fn catalog_asset_ignores_nested_lessons() {
        let bytes = br#"[{"id": 0, "category": "Swift",
            "content": {"id": 0, "lessons": [{"id": 0, "title": "Intro"}]},
            "test": {"id": 0, "questions": []}}]"#;
        let modules = decode_catalog_asset("data.json", bytes).unwrap();
        assert_eq!(modules.len(), 1);
        assert!(modules[0].lessons().is_empty());
    }

    #[test]
    fn seed_bundle_keeps_nested_items() {
        let bytes = br#"[{"id": 0, "category": "Swift",
            "content": {"id": 0, "lessons": [{"id": 0, "title": "Intro"}, {"title": "Next"}]},
            "test": {"id": 0, "questions": [{"correctIndex": 0, "answers": ["yes"]}]}}]"#;
        let seeded = decode_seed_bundle("data.json", bytes).unwrap();
        assert_eq!(seeded[0].lessons.len(), 2);
        assert_eq!(seeded[0].lessons[1].id().as_str(), "1");
        assert_eq!(seeded[0].questions.len(), 1);
    }

    #[test]
    fn seed_documents_follow_the_store_layout() {
        let bytes = br#"[{"id": "m1", "category": "Swift",
            "content": {"lessons": [{"id": "l1", "title": "Intro"}]},
            "test": {"questions": [{"id": "q1", "correctIndex": 0, "answers": ["yes"]}]}}]"#;
        let seeded = decode_seed_bundle("data.json", bytes).unwrap();
        let paths: Vec<String> = seed_documents(&seeded)
            .iter()
            .map(|(path, _)| path.to_string())
            .collect();
        assert_eq!(
            paths,
            ["modules/m1", "modules/m1/lessons/l1", "modules/m1/questions/q1"]
        );
    }

    #[test]
    fn progress_payload_names_the_module_by_id() {
        let fields = encode_progress(&ProgressSnapshot {
            module: Some(m1()),
            lesson: 2,
            question: 0,
        });
        assert_eq!(fields["lastModule"], json!("m1"));
        assert_eq!(fields["lastLesson"], json!(2));
        assert_eq!(fields["lastQuestion"], json!(0));
        assert!(!fields.contains_key("name"));
    }

    #[test]
    fn progress_payload_without_a_module_keeps_the_stored_one() {
        let fields = encode_progress(&ProgressSnapshot::default());
        assert!(!fields.contains_key("lastModule"));
        assert_eq!(fields["lastLesson"], json!(0));
    }

    #[test]
    fn encoded_module_has_no_nested_collections() {
        let d = doc(
            CollectionPath::modules(),
            "m1",
            json!({"category": "Swift", "content": {"id": "c"}, "test": {"id": "t"}}),
        );
        let module = decode_module(&d).unwrap();
        let fields = encode_module(&module);
        assert_eq!(fields["id"], json!("m1"));
        assert!(fields["content"].get("lessons").is_none());

        let user = DocumentPath::user(&IdentityId::new("u").unwrap());
        assert_eq!(user.to_string(), "users/u");
    }
}
