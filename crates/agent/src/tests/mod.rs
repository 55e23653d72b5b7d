mod pipeline_flow;
