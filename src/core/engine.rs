use crate::domain::ports::Workflow;
use crate::utils::error::Result;

pub struct SubmitEngine<W: Workflow> {
    workflow: W,
}

impl<W: Workflow> SubmitEngine<W> {
    pub fn new(workflow: W) -> Self {
        Self { workflow }
    }

    pub async fn run(&self) -> Result<String> {
        println!("Starting submission workflow...");

        // Assemble
        println!("Assembling job spec...");
        let spec = self.workflow.assemble().await?;
        println!("Job: {} / {}", spec.extension, spec.cmd);

        // Render
        println!("Rendering statement...");
        let script = self.workflow.render(spec).await?;
        println!("Rendered {} bytes", script.statement.len());

        // Deliver
        println!("Writing script...");
        let output_path = self.workflow.deliver(script).await?;
        println!("Script saved to: {}", output_path);

        Ok(output_path)
    }
}
