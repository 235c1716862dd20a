use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::Json;
use uuid::Uuid;

use super::{next_order, IdentityStore, MembershipUpsert, SurveyStore};
use crate::error::{AppError, AppResult};
use crate::models::{
    Organization, Question, QuestionBankQuestion, QuestionOptions, QuestionType, User,
};

#[derive(Default)]
struct State {
    organizations: Vec<Organization>,
    users: Vec<User>,
    surveys: Vec<Uuid>,
    bank_questions: Vec<QuestionBankQuestion>,
    questions: Vec<Question>,
}

/// In-process store that counts calls and writes, for exercising the
/// reconciler and question-bank logic without a database.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    calls: AtomicUsize,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn organizations(&self) -> Vec<Organization> {
        self.state.lock().unwrap().organizations.clone()
    }

    pub fn users(&self) -> Vec<User> {
        self.state.lock().unwrap().users.clone()
    }

    pub fn questions(&self, survey_id: Uuid) -> Vec<Question> {
        self.state
            .lock()
            .unwrap()
            .questions
            .iter()
            .filter(|q| q.survey_id == survey_id)
            .cloned()
            .collect()
    }

    pub fn seed_organization(&self, clerk_org_id: &str, name: &str) -> Organization {
        let now = Utc::now();
        let org = Organization {
            id: Uuid::new_v4(),
            clerk_org_id: clerk_org_id.to_string(),
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.state.lock().unwrap().organizations.push(org.clone());
        org
    }

    pub fn seed_user(&self, clerk_id: &str, email: &str, organization_id: Uuid) -> User {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            clerk_id: clerk_id.to_string(),
            email: email.to_string(),
            name: None,
            organization_id,
            role: Some("org:member".to_string()),
            created_at: now,
            updated_at: now,
        };
        self.state.lock().unwrap().users.push(user.clone());
        user
    }

    pub fn seed_survey(&self) -> Uuid {
        let id = Uuid::new_v4();
        self.state.lock().unwrap().surveys.push(id);
        id
    }

    pub fn seed_question(&self, survey_id: Uuid, order: i32) -> Question {
        let now = Utc::now();
        let question = Question {
            id: Uuid::new_v4(),
            survey_id,
            text: format!("Existing question {}", order),
            question_type: QuestionType::Text,
            options: None,
            sort_order: order,
            question_bank_question_id: None,
            created_at: now,
            updated_at: now,
        };
        self.state.lock().unwrap().questions.push(question.clone());
        question
    }

    pub fn seed_bank_question(
        &self,
        organization_id: Uuid,
        text: &str,
        question_type: QuestionType,
        options: Option<QuestionOptions>,
    ) -> QuestionBankQuestion {
        let now = Utc::now();
        let question = QuestionBankQuestion {
            id: Uuid::new_v4(),
            organization_id,
            text: text.to_string(),
            question_type,
            options: options.map(Json),
            created_at: now,
            updated_at: now,
        };
        self.state
            .lock()
            .unwrap()
            .bank_questions
            .push(question.clone());
        question
    }

    fn read(&self) -> std::sync::MutexGuard<'_, State> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.state.lock().unwrap()
    }

    fn write(&self) -> std::sync::MutexGuard<'_, State> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.read()
    }
}

#[async_trait]
impl IdentityStore for MemoryStore {
    async fn find_organization_by_clerk_id(
        &self,
        clerk_org_id: &str,
    ) -> AppResult<Option<Organization>> {
        let state = self.read();
        Ok(state
            .organizations
            .iter()
            .find(|o| o.clerk_org_id == clerk_org_id)
            .cloned())
    }

    async fn upsert_organization(
        &self,
        clerk_org_id: &str,
        name: &str,
    ) -> AppResult<Organization> {
        let mut state = self.write();
        let now = Utc::now();
        if let Some(org) = state
            .organizations
            .iter_mut()
            .find(|o| o.clerk_org_id == clerk_org_id)
        {
            org.name = name.to_string();
            org.updated_at = now;
            return Ok(org.clone());
        }
        let org = Organization {
            id: Uuid::new_v4(),
            clerk_org_id: clerk_org_id.to_string(),
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        };
        state.organizations.push(org.clone());
        Ok(org)
    }

    async fn delete_organization_by_clerk_id(&self, clerk_org_id: &str) -> AppResult<bool> {
        let mut state = self.write();
        let Some(pos) = state
            .organizations
            .iter()
            .position(|o| o.clerk_org_id == clerk_org_id)
        else {
            return Ok(false);
        };
        let org = state.organizations.remove(pos);
        state.users.retain(|u| u.organization_id != org.id);
        Ok(true)
    }

    async fn find_user_by_clerk_id(&self, clerk_id: &str) -> AppResult<Option<User>> {
        let state = self.read();
        Ok(state.users.iter().find(|u| u.clerk_id == clerk_id).cloned())
    }

    async fn update_user_profile(
        &self,
        clerk_id: &str,
        email: &str,
        name: Option<&str>,
    ) -> AppResult<Option<User>> {
        let mut state = self.write();
        let Some(user) = state.users.iter_mut().find(|u| u.clerk_id == clerk_id) else {
            return Ok(None);
        };
        if !email.is_empty() {
            user.email = email.to_string();
        }
        user.name = name.map(str::to_string);
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn upsert_membership_user(&self, upsert: &MembershipUpsert) -> AppResult<User> {
        let mut state = self.write();
        if !state
            .organizations
            .iter()
            .any(|o| o.id == upsert.organization_id)
        {
            return Err(AppError::Internal(format!(
                "organization {} does not exist",
                upsert.organization_id
            )));
        }

        let now = Utc::now();
        if let Some(user) = state
            .users
            .iter_mut()
            .find(|u| u.clerk_id == upsert.clerk_id)
        {
            if !upsert.email.is_empty() {
                user.email = upsert.email.clone();
            }
            if let Some(name) = &upsert.name {
                user.name = Some(name.clone());
            }
            user.organization_id = upsert.organization_id;
            user.role = Some(upsert.role.clone());
            user.updated_at = now;
            return Ok(user.clone());
        }

        let user = User {
            id: Uuid::new_v4(),
            clerk_id: upsert.clerk_id.clone(),
            email: upsert.email_for_create().to_string(),
            name: upsert.name.clone(),
            organization_id: upsert.organization_id,
            role: Some(upsert.role.clone()),
            created_at: now,
            updated_at: now,
        };
        state.users.push(user.clone());
        Ok(user)
    }

    async fn clear_user_role(&self, clerk_id: &str) -> AppResult<Option<User>> {
        let mut state = self.write();
        let Some(user) = state.users.iter_mut().find(|u| u.clerk_id == clerk_id) else {
            return Ok(None);
        };
        user.role = None;
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn delete_user_by_clerk_id(&self, clerk_id: &str) -> AppResult<bool> {
        let mut state = self.write();
        let before = state.users.len();
        state.users.retain(|u| u.clerk_id != clerk_id);
        Ok(state.users.len() < before)
    }
}

#[async_trait]
impl SurveyStore for MemoryStore {
    async fn find_bank_question(&self, id: Uuid) -> AppResult<Option<QuestionBankQuestion>> {
        let state = self.read();
        Ok(state.bank_questions.iter().find(|q| q.id == id).cloned())
    }

    async fn append_question_from_bank(
        &self,
        bank_question: &QuestionBankQuestion,
        survey_id: Uuid,
    ) -> AppResult<Question> {
        let mut state = self.write();
        if !state.surveys.contains(&survey_id) {
            return Err(AppError::NotFound(format!(
                "Survey with ID {} not found",
                survey_id
            )));
        }

        let current_max = state
            .questions
            .iter()
            .filter(|q| q.survey_id == survey_id)
            .map(|q| q.sort_order)
            .max();

        let sort_order = next_order(current_max)?;
        let now = Utc::now();
        let question = Question {
            id: Uuid::new_v4(),
            survey_id,
            text: bank_question.text.clone(),
            question_type: bank_question.question_type,
            options: bank_question.options.clone(),
            sort_order,
            question_bank_question_id: Some(bank_question.id),
            created_at: now,
            updated_at: now,
        };
        state.questions.push(question.clone());
        Ok(question)
    }
}
