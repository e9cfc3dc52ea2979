//! Administrative commands over the registry.
//!
//! Replies are plain chat text. The dispatch layer decides who is calling and
//! from where; [`Admin::execute`] only accepts administrators inside a group.

use crate::registry::Registry;

/// Reply texts
pub mod reply {
    pub const SERVICE_NOT_FOUND: &str = "没有找到指定服务!";
    pub const ENABLED: &str = "已启用服务: ";
    pub const DISABLED: &str = "已关闭服务: ";
    pub const NO_HELP: &str = "该服务无帮助!";
    pub const LIST_HEADER: &str = "---服务列表---";
    pub const SAVE_FAILED: &str = "服务状态保存失败: ";
    pub const ADMIN_ONLY: &str = "该命令仅限管理员使用!";
    pub const GROUP_ONLY: &str = "该命令仅限群聊使用!";
}

/// Recognized administrative commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCommand {
    Enable(String),
    Disable(String),
    Usage(String),
    ListServices,
}

impl AdminCommand {
    /// Parse `<name> [service]`. An optional leading `/` is accepted.
    ///
    /// ```
    /// use groupctl_core::AdminCommand;
    /// assert_eq!(
    ///     AdminCommand::parse("启用 weather"),
    ///     Some(AdminCommand::Enable("weather".into()))
    /// );
    /// assert_eq!(AdminCommand::parse("/service_list"), Some(AdminCommand::ListServices));
    /// assert!(AdminCommand::parse("hello").is_none());
    /// ```
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        let input = input.strip_prefix('/').unwrap_or(input);
        let (name, args) = match input.split_once(char::is_whitespace) {
            Some((name, args)) => (name, args.trim()),
            None => (input, ""),
        };

        match name {
            "启用" | "enable" => Some(Self::Enable(args.to_string())),
            "禁用" | "disable" => Some(Self::Disable(args.to_string())),
            "用法" | "usage" => Some(Self::Usage(args.to_string())),
            "服务列表" | "service_list" => Some(Self::ListServices),
            _ => None,
        }
    }
}

/// Who issued a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandContext {
    /// Group the command was sent in; `None` for private chats
    pub group_id: Option<i64>,
    pub is_admin: bool,
}

impl CommandContext {
    pub fn group_admin(group_id: i64) -> Self {
        Self {
            group_id: Some(group_id),
            is_admin: true,
        }
    }
}

/// Administrative operations for privileged callers.
pub struct Admin<'a> {
    registry: &'a Registry,
}

impl<'a> Admin<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self { registry }
    }

    pub fn enable(&self, service: &str, gid: i64) -> String {
        let Some(control) = self.registry.lookup(service) else {
            return reply::SERVICE_NOT_FOUND.to_string();
        };
        match control.enable(gid) {
            Ok(()) => {
                tracing::info!(service, gid, "enabled service");
                format!("{}{}", reply::ENABLED, service)
            }
            Err(e) => {
                tracing::error!(service, gid, "[control] {}", e);
                format!("{}{}", reply::SAVE_FAILED, e)
            }
        }
    }

    pub fn disable(&self, service: &str, gid: i64) -> String {
        let Some(control) = self.registry.lookup(service) else {
            return reply::SERVICE_NOT_FOUND.to_string();
        };
        match control.disable(gid) {
            Ok(()) => {
                tracing::info!(service, gid, "disabled service");
                format!("{}{}", reply::DISABLED, service)
            }
            Err(e) => {
                tracing::error!(service, gid, "[control] {}", e);
                format!("{}{}", reply::SAVE_FAILED, e)
            }
        }
    }

    pub fn usage(&self, service: &str) -> String {
        match self.registry.lookup(service) {
            Some(control) => control.help().unwrap_or(reply::NO_HELP).to_string(),
            None => reply::SERVICE_NOT_FOUND.to_string(),
        }
    }

    /// 1-indexed listing of every registered service.
    pub fn list_services(&self) -> String {
        let mut msg = String::from(reply::LIST_HEADER);
        for (i, service) in self.registry.services().iter().enumerate() {
            msg.push_str(&format!("\n{}: {}", i + 1, service));
        }
        msg
    }

    /// Run a command on behalf of `ctx`.
    pub fn execute(&self, command: &AdminCommand, ctx: &CommandContext) -> String {
        if !ctx.is_admin {
            return reply::ADMIN_ONLY.to_string();
        }
        let Some(gid) = ctx.group_id else {
            return reply::GROUP_ONLY.to_string();
        };

        match command {
            AdminCommand::Enable(service) => self.enable(service, gid),
            AdminCommand::Disable(service) => self.disable(service, gid),
            AdminCommand::Usage(service) => self.usage(service),
            AdminCommand::ListServices => self.list_services(),
        }
    }
}
