//! Interactive menu shown when the installer is started without a subcommand.
//!
//! Screens form a stack: choosing an entry pushes the next screen, Esc pops
//! back to the previous one, and Esc on the first screen quits.
use anyhow::Result;
use console::style;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, MultiSelect, Select};

use crate::cli::GlobalOpts;
use crate::config::catalog::{self, Component, InstallMode, Profile};
use crate::deploy::{RunRequest, Target};
use crate::logging::Logger;

use super::{Session, execute};

const HOME_LOCAL: usize = 0;
const HOME_REMOTE: usize = 1;

#[derive(Debug)]
enum Screen {
    Home,
    Machines,
    Profile(Target),
    Custom(Target),
    Mode(Vec<&'static str>),
    Confirm(RunRequest),
}

#[derive(Debug)]
enum Step {
    Push(Screen),
    Stay,
    Back,
    Quit,
    Run(RunRequest),
}

/// Run the interactive menu until the user quits.
///
/// # Errors
///
/// Returns an error if the root cannot be resolved or the terminal cannot be
/// driven.
pub fn run(global: &GlobalOpts, log: &Logger) -> Result<()> {
    let session = Session::init(global, log)?;
    let menu = Menu {
        session: &session,
        log,
        theme: ColorfulTheme::default(),
    };

    let mut stack = vec![Screen::Home];
    while let Some(screen) = stack.last() {
        match menu.show(screen)? {
            Step::Push(next) => stack.push(next),
            Step::Stay => {}
            Step::Back => {
                stack.pop();
            }
            Step::Quit => break,
            Step::Run(request) => {
                let report = execute(&request, &session, log)?;
                log.print_report(&report);
                if !menu.return_to_menu()? {
                    break;
                }
                stack.truncate(1);
            }
        }
    }
    Ok(())
}

struct Menu<'a> {
    session: &'a Session,
    log: &'a Logger,
    theme: ColorfulTheme,
}

impl Menu<'_> {
    fn show(&self, screen: &Screen) -> Result<Step> {
        match screen {
            Screen::Home => self.home(),
            Screen::Machines => self.machines(),
            Screen::Profile(target) => self.profile(target),
            Screen::Custom(target) => self.custom(target),
            Screen::Mode(components) => self.mode(components),
            Screen::Confirm(request) => self.confirm(request),
        }
    }

    fn home(&self) -> Result<Step> {
        self.log.stage(&format!(
            "Dotfiles installer {}",
            super::version::version()
        ));
        self.log.info(&format!(
            "platform: {} ({})",
            self.session.platform.name, self.session.platform.arch
        ));
        self.log
            .info(&format!("root: {}", self.session.config.root.display()));
        self.log.info(&format!(
            "remote machines: {}",
            self.session.config.machines.len()
        ));
        self.log.blank();

        let items = [
            "Install on this machine",
            "Deploy to a remote machine",
            "Quit",
        ];
        let choice = Select::with_theme(&self.theme)
            .with_prompt("What would you like to do?")
            .items(&items)
            .default(HOME_LOCAL)
            .interact_opt()?;
        Ok(match choice {
            Some(HOME_LOCAL) => Step::Push(Screen::Profile(Target::Local)),
            Some(HOME_REMOTE) if self.session.config.machines.is_empty() => {
                self.log
                    .warn("No remote machines configured. Add them to machines.yaml");
                Step::Stay
            }
            Some(HOME_REMOTE) => Step::Push(Screen::Machines),
            _ => Step::Quit,
        })
    }

    fn machines(&self) -> Result<Step> {
        let items: Vec<String> = self
            .session
            .config
            .machines
            .iter()
            .map(ToString::to_string)
            .collect();
        let choice = Select::with_theme(&self.theme)
            .with_prompt("Select a machine")
            .items(&items)
            .default(0)
            .interact_opt()?;
        let machine = choice.and_then(|i| self.session.config.machines.iter().nth(i));
        Ok(machine.map_or(Step::Back, |m| {
            Step::Push(selection_screen(Target::remote(m.clone())))
        }))
    }

    fn profile(&self, target: &Target) -> Result<Step> {
        let mut items: Vec<String> = Profile::ALL
            .iter()
            .map(|p| format!("{} - {}", p.title(), p.description()))
            .collect();
        items.push("Custom - Pick individual components".to_string());

        let Some(choice) = Select::with_theme(&self.theme)
            .with_prompt(format!("Choose a profile for {target}"))
            .items(&items)
            .default(0)
            .interact_opt()?
        else {
            return Ok(Step::Back);
        };
        match Profile::ALL.get(choice) {
            Some(profile) => after_selection(target, profile.components().to_vec()),
            None => Ok(Step::Push(Screen::Custom(target.clone()))),
        }
    }

    fn custom(&self, target: &Target) -> Result<Step> {
        let catalog = catalog_for(target);
        let items: Vec<String> = catalog
            .iter()
            .map(|c| format!("{:<13} {}", c.id, style(c.description).dim()))
            .collect();
        let defaults = vec![true; catalog.len()];

        let Some(picked) = MultiSelect::with_theme(&self.theme)
            .with_prompt("Select components (space to toggle, enter to confirm)")
            .items(&items)
            .defaults(&defaults)
            .interact_opt()?
        else {
            return Ok(Step::Back);
        };
        let components: Vec<&'static str> = picked
            .into_iter()
            .filter_map(|i| catalog.get(i))
            .map(|c| c.id)
            .collect();
        if components.is_empty() {
            self.log.warn("Please select at least one component");
            return Ok(Step::Stay);
        }
        after_selection(target, components)
    }

    fn mode(&self, components: &[&'static str]) -> Result<Step> {
        let items: Vec<String> = InstallMode::ALL
            .iter()
            .map(|m| format!("{} - {}", m.title(), m.description()))
            .collect();
        let choice = Select::with_theme(&self.theme)
            .with_prompt("Installation mode")
            .items(&items)
            .default(0)
            .interact_opt()?;
        match choice.and_then(|i| InstallMode::ALL.get(i)) {
            Some(mode) => Ok(Step::Push(Screen::Confirm(RunRequest::new(
                Target::Local,
                components.iter().copied(),
                *mode,
            )?))),
            None => Ok(Step::Back),
        }
    }

    fn confirm(&self, request: &RunRequest) -> Result<Step> {
        self.log.stage("Ready to install");
        self.log.info(&format!("target: {}", request.target()));
        self.log
            .info(&format!("components: {}", request.components().join(", ")));
        if request.target() == &Target::Local {
            self.log.info(&format!("mode: {}", request.mode().title()));
        }

        let start = Confirm::with_theme(&self.theme)
            .with_prompt("Start installation?")
            .default(true)
            .interact_opt()?;
        Ok(if start == Some(true) {
            Step::Run(request.clone())
        } else {
            Step::Back
        })
    }

    fn return_to_menu(&self) -> Result<bool> {
        let again = Confirm::with_theme(&self.theme)
            .with_prompt("Return to the main menu?")
            .default(true)
            .interact_opt()?;
        Ok(again == Some(true))
    }
}

/// Component catalog offered for `target`.
fn catalog_for(target: &Target) -> &'static [Component] {
    if target.is_windows() {
        catalog::WINDOWS_COMPONENTS
    } else {
        catalog::COMPONENTS
    }
}

/// First screen after a machine is chosen. Windows hosts have no profiles.
fn selection_screen(target: Target) -> Screen {
    if target.is_windows() {
        Screen::Custom(target)
    } else {
        Screen::Profile(target)
    }
}

/// Local runs still need a mode; remote runs go straight to confirmation.
fn after_selection(target: &Target, components: Vec<&'static str>) -> Result<Step> {
    Ok(match target {
        Target::Local => Step::Push(Screen::Mode(components)),
        remote => Step::Push(Screen::Confirm(RunRequest::new(
            remote.clone(),
            components,
            InstallMode::Full,
        )?)),
    })
}
