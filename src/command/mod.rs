//! Command / command-handler protocol.
//!
//! Commands are produced by agent code on agent threads and applied by the
//! orchestrator through a `CommandHandler` callback. A turn is complete only
//! once a command with `ends_turn() == true` has been handled.

mod end_turn;
mod traits;

pub use end_turn::EndTurnCommand;
pub use traits::{BoxedCommand, Command, CommandHandler};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ActionLog, ActionRecord, TeamId};
    use crate::simulation::TurnController;

    #[derive(Debug, Default)]
    struct Tally {
        hits: Vec<u32>,
    }

    impl TurnController for Tally {
        type Action = u32;

        fn current_team(&self) -> TeamId {
            TeamId::new(0)
        }
    }

    #[derive(Debug)]
    struct Hit(u32);

    impl Command<Tally> for Hit {
        fn on_execute(&self, controller: &mut Tally) -> ActionLog<u32> {
            controller.hits.push(self.0);
            let mut log = ActionLog::new();
            log.push(ActionRecord::new(TeamId::new(0), 0, 0, self.0));
            log
        }
    }

    #[test]
    fn test_end_turn_command() {
        let mut tally = Tally::default();
        let end = EndTurnCommand::new();
        assert!(Command::<Tally>::ends_turn(&end));
        assert!(end.on_execute(&mut tally).is_empty());
        assert!(tally.hits.is_empty());
    }

    #[test]
    fn test_closure_handler_applies_in_order() {
        let mut tally = Tally::default();
        let mut lens = Vec::new();
        {
            let mut handler = |command: BoxedCommand<Tally>| {
                lens.push(command.on_execute(&mut tally).len());
            };
            for n in [3, 1, 2] {
                CommandHandler::<Tally>::handle_command(&mut handler, Box::new(Hit(n)));
            }
            CommandHandler::<Tally>::handle_command(&mut handler, Box::new(EndTurnCommand::new()));
        }
        assert_eq!(tally.hits, vec![3, 1, 2]);
        assert_eq!(lens, vec![1, 1, 1, 0]);
    }

    #[test]
    fn test_commands_default_to_not_ending_turn() {
        assert!(!Hit(1).ends_turn());
    }
}
