use crate::engine::config::WorkflowType;

/// Reads geometry and wavefunction back from the previous task's checkpoint.
const FROM_CHECKPOINT: &str = "pop=NPA density=current Geom=AllCheck Guess=Read";

/// One computational step of a chained job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDescriptor {
    pub index: usize,
    /// Route line body, without the leading `# `.
    pub keyword: String,
    pub continues_from_checkpoint: bool,
}

/// Ordered task sequence for `workflow_type`.
///
/// `basis_token` is the job-level basis keyword decided by
/// [`build_basis_setup`](crate::engine::basis::build_basis_setup).
pub fn build_task_sequence(
    workflow_type: WorkflowType,
    theory: &str,
    basis_token: &str,
) -> Vec<TaskDescriptor> {
    let level = format!("{theory}/{basis_token}");
    let keywords = match workflow_type {
        WorkflowType::Equilibrium => vec![
            format!("opt=CalcFc {level} scf=xqc"),
            format!("freq {level} volume NMR {FROM_CHECKPOINT}"),
            format!("TD(NStates=10, Root=1) {level} volume {FROM_CHECKPOINT}"),
        ],
        WorkflowType::TransitionState => vec![
            format!("opt=(calcfc,ts,noeigentest) scf=xqc {level}"),
            format!("freq {level} volume NMR {FROM_CHECKPOINT}"),
        ],
        WorkflowType::Test => vec![level],
    };

    keywords
        .into_iter()
        .enumerate()
        .map(|(index, keyword)| TaskDescriptor {
            index,
            keyword,
            continues_from_checkpoint: index > 0,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(tasks: &[TaskDescriptor]) -> Vec<bool> {
        tasks.iter().map(|t| t.continues_from_checkpoint).collect()
    }

    #[test]
    fn equilibrium_has_three_chained_tasks() {
        let tasks = build_task_sequence(WorkflowType::Equilibrium, "APFD", "6-31G*");
        assert_eq!(tasks.len(), 3);
        assert_eq!(flags(&tasks), vec![false, true, true]);
        assert_eq!(tasks[0].keyword, "opt=CalcFc APFD/6-31G* scf=xqc");
        assert_eq!(
            tasks[1].keyword,
            "freq APFD/6-31G* volume NMR pop=NPA density=current Geom=AllCheck Guess=Read"
        );
        assert_eq!(
            tasks[2].keyword,
            "TD(NStates=10, Root=1) APFD/6-31G* volume pop=NPA density=current Geom=AllCheck Guess=Read"
        );
    }

    #[test]
    fn transition_state_has_two_chained_tasks() {
        let tasks = build_task_sequence(WorkflowType::TransitionState, "B3LYP", "genecp");
        assert_eq!(tasks.len(), 2);
        assert_eq!(flags(&tasks), vec![false, true]);
        assert_eq!(tasks[0].keyword, "opt=(calcfc,ts,noeigentest) scf=xqc B3LYP/genecp");
        assert!(tasks[1].keyword.starts_with("freq B3LYP/genecp "));
    }

    #[test]
    fn test_workflow_is_a_single_point() {
        let tasks = build_task_sequence(WorkflowType::Test, "APFD", "6-31G*");
        assert_eq!(
            tasks,
            vec![TaskDescriptor {
                index: 0,
                keyword: "APFD/6-31G*".to_string(),
                continues_from_checkpoint: false,
            }]
        );
    }

    #[test]
    fn indices_follow_sequence_order() {
        let tasks = build_task_sequence(WorkflowType::Equilibrium, "APFD", "genecp");
        for (i, task) in tasks.iter().enumerate() {
            assert_eq!(task.index, i);
            assert!(task.keyword.contains("APFD/genecp"));
        }
    }
}
