//! `tourdesk users ...`

use anyhow::{Result, bail};
use tourdesk_business::{ManagementAction, ManagementTab, UserManagement};
use tracing::instrument;

use crate::cli::{ListArgs, UserCommands};
use crate::commands::list::list_view;
use crate::context::CliContext;
use crate::output::Output;

fn screen(ctx: &CliContext) -> UserManagement {
    UserManagement::new(
        ctx.client.clone(),
        ctx.config.controller_config(),
        ctx.config.acting_user_id.clone(),
    )
}

#[instrument(skip_all, name = "users_list", fields(tab = %tab, page = args.page))]
pub async fn run_users_list(
    ctx: &CliContext,
    tab: ManagementTab,
    args: &ListArgs,
    out: &Output,
) -> Result<()> {
    let mut screen = screen(ctx);
    let (model, warnings) = list_view(screen.registry_mut(), tab.key(), args).await?;
    for warning in warnings {
        out.warning(warning);
    }
    out.table(&model);
    Ok(())
}

/// Maps a moderation subcommand to its action. `None` for `list`.
pub fn moderation_action(command: UserCommands) -> Option<ManagementAction> {
    Some(match command {
        UserCommands::List { .. } => return None,
        UserCommands::Approve { ids } => ManagementAction::Approve(ids),
        UserCommands::Reject { ids } => ManagementAction::Reject(ids),
        UserCommands::Deactivate { ids } => ManagementAction::Deactivate(ids),
        UserCommands::Reactivate { ids } => ManagementAction::Reactivate(ids),
        UserCommands::ResolveComplaint { ids } => ManagementAction::ResolveComplaint(ids),
        UserCommands::DeleteTag { ids } => ManagementAction::DeleteTag(ids),
    })
}

#[instrument(skip_all, name = "moderate", fields(kind = action.kind().label()))]
pub async fn run_moderation(ctx: &CliContext, action: &ManagementAction, out: &Output) -> Result<()> {
    let mut screen = screen(ctx);
    let outcome = screen.perform(action).await;
    screen.settle().await;
    out.mutation(&outcome, screen.mutation());
    if !outcome.is_complete() {
        bail!(
            "{} failed for {} target(s)",
            action.kind().label(),
            outcome.failed.len()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use tourdesk_business::BusinessConfig;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[test]
    fn subcommands_map_to_actions() {
        assert_eq!(
            moderation_action(UserCommands::Reject {
                ids: vec!["u1".to_owned()]
            }),
            Some(ManagementAction::Reject(vec!["u1".to_owned()]))
        );
        assert_eq!(
            moderation_action(UserCommands::List {
                tab: ManagementTab::Tags,
                list: ListArgs::default(),
            }),
            None
        );
    }

    #[tokio::test]
    async fn partial_failures_fail_the_command() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/admin/complaints/c1/resolve"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/admin/complaints/c2/resolve"))
            .respond_with(ResponseTemplate::new(404).set_body_string("no such complaint"))
            .expect(1)
            .mount(&server)
            .await;

        let ctx = CliContext::new(BusinessConfig::new(server.uri()));
        let action = ManagementAction::ResolveComplaint(vec!["c1".to_owned(), "c2".to_owned()]);
        let error = run_moderation(&ctx, &action, &Output::new())
            .await
            .expect_err("one target failed");
        assert_eq!(error.to_string(), "resolve complaint failed for 1 target(s)");
    }
}
