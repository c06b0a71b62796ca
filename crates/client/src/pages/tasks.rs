//! Design and fitting tasks.
//!
//! Managers and supervisors see and assign every task. Designers and
//! fitters only hold `editOwn`, so they see the tasks assigned to or
//! created by them and may only move those along.

use hoarding_core::models::{Owned, Task, TaskKind};
use hoarding_core::rbac::{self, Resource};
use hoarding_core::{HoardingId, TaskId, UserId};
use serde_json::json;

use super::{LoadState, Loader, PageContext, PageError, compact};
use crate::api::ApiError;
use crate::forms::{ValidationErrors, Validator};

const TASKS: &str = "/tasks";

/// Task states the backend accepts, in workflow order.
pub const TASK_STATUSES: &[&str] = &["pending", "in_progress", "completed"];

#[derive(Debug, Clone, Default)]
pub struct TaskForm {
    pub title: String,
    pub kind: Option<TaskKind>,
    pub hoarding_id: Option<HoardingId>,
    pub assigned_to: Option<UserId>,
    pub due_date: String,
}

impl TaskForm {
    /// # Errors
    ///
    /// Returns every field problem found.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut validator = Validator::new()
            .required("title", &self.title)
            .present("type", self.kind.as_ref());
        if !self.due_date.trim().is_empty() {
            validator = validator.date("dueDate", &self.due_date);
        }
        validator.finish()
    }

    #[must_use]
    pub fn to_body(&self) -> serde_json::Value {
        compact(json!({
            "title": self.title.trim(),
            "type": self.kind,
            "hoardingId": self.hoarding_id,
            "assignedTo": self.assigned_to,
            "dueDate": self.due_date.trim(),
        }))
    }
}

#[derive(Debug)]
pub struct TasksPage {
    ctx: PageContext,
    loader: Loader<Vec<Task>>,
}

impl TasksPage {
    #[must_use]
    pub fn new(ctx: PageContext) -> Self {
        Self {
            ctx,
            loader: Loader::new(),
        }
    }

    #[must_use]
    pub fn state(&self) -> LoadState<Vec<Task>> {
        self.loader.state()
    }

    pub fn unmount(&self) {
        self.loader.unmount();
    }

    pub async fn load(&self) -> LoadState<Vec<Task>> {
        self.loader
            .run(async {
                let user = self
                    .ctx
                    .require_access("tasks", |role| rbac::can_read(role, Resource::Tasks))?;
                let tasks: Vec<Task> = self.ctx.settle("tasks", self.ctx.list(TASKS).await);
                let own_only = !rbac::can_update(user.role, Resource::Tasks)
                    && rbac::can_edit_own(user.role, Resource::Tasks);
                Ok::<_, PageError>(if own_only {
                    tasks
                        .into_iter()
                        .filter(|task| task.is_owned_by(&user.id))
                        .collect()
                } else {
                    tasks
                })
            })
            .await
    }

    /// Loaded tasks of one kind.
    #[must_use]
    pub fn of_kind(&self, kind: TaskKind) -> Vec<Task> {
        self.loader
            .data()
            .unwrap_or_default()
            .into_iter()
            .filter(|task| task.parsed_kind() == Some(kind))
            .collect()
    }

    #[must_use]
    pub fn can_create(&self) -> bool {
        rbac::can_create(self.ctx.role(), Resource::Tasks)
    }

    #[must_use]
    pub fn can_assign(&self) -> bool {
        rbac::can_assign_tasks(self.ctx.role())
    }

    fn loaded(&self, id: &TaskId) -> Option<Task> {
        self.loader
            .data()?
            .into_iter()
            .find(|task| task.id.as_ref() == Some(id))
    }

    /// # Errors
    ///
    /// Returns `Forbidden` (also when the form assigns someone without
    /// `assignTasks`) or `Validation` without contacting the backend, or
    /// the request error.
    pub async fn create(&self, form: &TaskForm) -> Result<(), ApiError> {
        self.ctx.permit(self.can_create(), "create tasks")?;
        if form.assigned_to.is_some() {
            self.ctx.permit(self.can_assign(), "assign tasks")?;
        }
        form.validate().map_err(ApiError::Validation)?;
        self.ctx
            .mutate("Task created", self.ctx.api.post(TASKS, &form.to_body()))
            .await?;
        self.load().await;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `Forbidden` without `assignTasks`, or the request error.
    pub async fn assign(&self, id: &TaskId, user: &UserId) -> Result<(), ApiError> {
        self.ctx.permit(self.can_assign(), "assign tasks")?;
        self.ctx
            .mutate(
                "Task assigned",
                self.ctx
                    .api
                    .patch(&format!("{TASKS}/{id}/assign"), &json!({"assignedTo": user})),
            )
            .await?;
        self.load().await;
        Ok(())
    }

    /// Move a task to another workflow state.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for an unknown status, `Forbidden` when the
    /// role can neither update tasks nor owns this one, or the request
    /// error.
    pub async fn update_status(&self, id: &TaskId, status: &str) -> Result<(), ApiError> {
        let task = self.loaded(id);
        self.ctx.permit(
            self.ctx.may_modify(Resource::Tasks, task.as_ref()),
            "update this task",
        )?;
        Validator::new()
            .check("status", TASK_STATUSES.contains(&status), "is not a known task status")
            .finish()
            .map_err(ApiError::Validation)?;
        self.ctx
            .mutate(
                "Task updated",
                self.ctx
                    .api
                    .patch(&format!("{TASKS}/{id}/status"), &json!({"status": status})),
            )
            .await?;
        self.load().await;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use hoarding_core::Role;

    use super::*;
    use crate::pages::test_support::offline_context;

    #[test]
    fn test_form() {
        let errors = TaskForm::default().validate().unwrap_err();
        assert_eq!(errors.message_for("title"), Some("is required"));
        assert_eq!(errors.message_for("type"), Some("is required"));

        let form = TaskForm {
            title: "Mount Diwali flex".into(),
            kind: Some(TaskKind::Fitting),
            hoarding_id: Some(HoardingId::new("h1")),
            assigned_to: None,
            due_date: "2026-10-20".into(),
        };
        assert!(form.validate().is_ok());
        assert_eq!(
            form.to_body(),
            json!({
                "title": "Mount Diwali flex",
                "type": "fitting",
                "hoardingId": "h1",
                "dueDate": "2026-10-20"
            })
        );
    }

    #[test]
    fn test_permissions() {
        let (ctx, _) = offline_context(Some(Role::Supervisor));
        let page = TasksPage::new(ctx);
        assert!(page.can_create());
        assert!(page.can_assign());

        let (ctx, _) = offline_context(Some(Role::Fitter));
        let page = TasksPage::new(ctx);
        assert!(!page.can_create());
        assert!(!page.can_assign());
    }

    #[tokio::test]
    async fn test_fitter_cannot_assign() {
        let (ctx, _) = offline_context(Some(Role::Fitter));
        let page = TasksPage::new(ctx);
        let result = page.assign(&TaskId::new("t1"), &UserId::new("u2")).await;
        assert!(matches!(result, Err(ApiError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_fitter_cannot_update_unknown_task() {
        let (ctx, _) = offline_context(Some(Role::Fitter));
        let page = TasksPage::new(ctx);
        let result = page.update_status(&TaskId::new("t1"), "completed").await;
        assert!(matches!(result, Err(ApiError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_unknown_status_is_rejected_before_dispatch() {
        let (ctx, _) = offline_context(Some(Role::Manager));
        let page = TasksPage::new(ctx);
        let result = page.update_status(&TaskId::new("t1"), "done-ish").await;
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }
}
